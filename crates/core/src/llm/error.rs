use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Provider failure with enough context to debug it after the fact: which
/// stage broke (`http`, `decode`, `empty`) and the raw payload the provider
/// sent, which the Display chain deliberately leaves out.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    /// The raw provider payload, preferring the structured JSON body over
    /// the unparsed text.
    pub fn raw_payload(&self) -> Option<String> {
        if let Some(json) = &self.raw_response_json {
            return Some(json.to_string());
        }
        self.raw_output.clone()
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={:?}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}

/// Error detail for the result row of a failed run.
///
/// When the failure carries provider diagnostics, the raw response payload
/// is appended so it survives in the results file; plain errors keep their
/// context chain only.
pub fn persisted_detail(err: &anyhow::Error) -> String {
    let mut out = format!("{err:#}");
    if let Some(diag) = err.downcast_ref::<LlmDiagnosticsError>() {
        if let Some(raw) = diag.raw_payload() {
            out.push_str("; raw_response=");
            out.push_str(&raw);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diag(raw_output: Option<&str>, raw_json: Option<Value>) -> LlmDiagnosticsError {
        LlmDiagnosticsError {
            provider: Provider::Groq,
            stage: "http",
            detail: "status=401 Unauthorized".to_string(),
            raw_output: raw_output.map(|s| s.to_string()),
            raw_response_json: raw_json,
        }
    }

    #[test]
    fn persisted_detail_appends_raw_body_text() {
        let err = anyhow::Error::new(diag(Some("invalid api key"), None));
        let detail = persisted_detail(&err);
        assert!(detail.contains("stage=http"));
        assert!(detail.contains("raw_response=invalid api key"));
    }

    #[test]
    fn persisted_detail_prefers_structured_json() {
        let body = json!({"error": {"message": "invalid api key"}});
        let err = anyhow::Error::new(diag(Some("ignored text"), Some(body)));
        let detail = persisted_detail(&err);
        assert!(detail.contains(r#"raw_response={"error":{"message":"invalid api key"}}"#));
        assert!(!detail.contains("ignored text"));
    }

    #[test]
    fn persisted_detail_keeps_plain_errors_unchanged() {
        let err = anyhow::anyhow!("socket closed").context("Groq request failed");
        assert_eq!(persisted_detail(&err), "Groq request failed: socket closed");
    }

    #[test]
    fn display_stays_compact_without_raw_payload() {
        let s = diag(Some("a very long body"), None).to_string();
        assert_eq!(s, "LLM error (provider=Groq, stage=http): status=401 Unauthorized");
    }
}
