/// Normalize a model reply into plain answer text.
///
/// Chat models sometimes ignore the prose instruction and wrap the answer in
/// a fenced code block, or emit a JSON object with an `answer` field, with or
/// without prose around it. Unwrap those shapes; anything else passes
/// through trimmed.
pub fn normalize_answer(text: &str) -> String {
    let trimmed = text.trim();

    let candidate = match strip_code_fence(trimmed) {
        Some(inner) => inner,
        None => trimmed.to_string(),
    };

    if let Some(json_str) = extract_json_object(&candidate) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&json_str) {
            if let Some(answer) = value.get("answer").and_then(|v| v.as_str()) {
                return answer.trim().to_string();
            }
        }
    }

    candidate
}

/// Contents of a leading ```-fence (```json ... ``` or ``` ... ```), or
/// `None` when the text is not fenced.
fn strip_code_fence(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return None;
    }

    let mut inner = trimmed;
    if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
        inner = after_first;
    }
    if let Some(end) = inner.rfind("```") {
        inner = &inner[..end];
    }
    Some(inner.trim().to_string())
}

/// The first-`{`-to-last-`}` span of `text`, as a parse candidate for a
/// JSON object embedded in prose.
fn extract_json_object(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through_trimmed() {
        assert_eq!(
            normalize_answer("  The price of AAPL is $189.50.\n"),
            "The price of AAPL is $189.50."
        );
    }

    #[test]
    fn unwraps_answer_object() {
        let s = r#"{"answer": "MSFT has the highest price."}"#;
        assert_eq!(normalize_answer(s), "MSFT has the highest price.");
    }

    #[test]
    fn unwraps_fenced_answer_object() {
        let s = "```json\n{\"answer\": \"Technology\"}\n```";
        assert_eq!(normalize_answer(s), "Technology");
    }

    #[test]
    fn unwraps_answer_object_embedded_in_prose() {
        let s = "Here is the result:\n{\"answer\": \"AMZN has a market cap of $1610B.\"}\nLet me know if you need more.";
        assert_eq!(normalize_answer(s), "AMZN has a market cap of $1610B.");
    }

    #[test]
    fn keeps_fenced_text_without_answer_field() {
        let s = "```\nTechnology leads with 5 stocks.\n```";
        assert_eq!(normalize_answer(s), "Technology leads with 5 stocks.");
    }

    #[test]
    fn keeps_json_without_answer_field() {
        let s = r#"{"price": 189.5}"#;
        assert_eq!(normalize_answer(s), s);
    }

    #[test]
    fn braces_in_prose_do_not_eat_the_answer() {
        let s = "The set {AAPL, MSFT} covers Technology.";
        assert_eq!(normalize_answer(s), s);
    }
}
