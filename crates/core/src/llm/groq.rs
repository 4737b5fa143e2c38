use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{AnalysisInput, Answer, LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl GroqClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_groq_api_key()?.to_string();
        Self::with_api_key(api_key)
    }

    pub fn with_api_key(api_key: String) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "GROQ_API_KEY is empty");

        let base_url =
            std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("GROQ_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = std::env::var("GROQ_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(crate::config::DEFAULT_TEMPERATURE);

        let timeout_secs = std::env::var("GROQ_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
            temperature,
        })
    }

    async fn create_chat(
        &self,
        req: ChatCompletionRequest,
    ) -> anyhow::Result<(serde_json::Value, ChatCompletionResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );

        let url = format!(
            "{}/openai/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Groq request failed")?;

        let status = res.status();
        let text = match res.text().await {
            Ok(text) => text,
            Err(e) => {
                return Err(LlmDiagnosticsError {
                    provider: Provider::Groq,
                    stage: "http",
                    detail: format!("failed to read response body: {e}"),
                    raw_output: None,
                    raw_response_json: None,
                }
                .into());
            }
        };
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Groq,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        Self::decode_body(&text)
    }

    fn decode_body(text: &str) -> anyhow::Result<(serde_json::Value, ChatCompletionResponse)> {
        let raw_json = match serde_json::from_str::<serde_json::Value>(text) {
            Ok(v) => v,
            Err(e) => {
                return Err(LlmDiagnosticsError {
                    provider: Provider::Groq,
                    stage: "decode",
                    detail: format!("response body is not JSON: {e}"),
                    raw_output: Some(text.to_string()),
                    raw_response_json: None,
                }
                .into());
            }
        };

        match serde_json::from_value::<ChatCompletionResponse>(raw_json.clone()) {
            Ok(parsed) => Ok((raw_json, parsed)),
            Err(e) => Err(LlmDiagnosticsError {
                provider: Provider::Groq,
                stage: "decode",
                detail: format!("unexpected response shape: {e}"),
                raw_output: Some(text.to_string()),
                raw_response_json: Some(raw_json),
            }
            .into()),
        }
    }

    fn system_prompt() -> String {
        [
            "You are a stock data analyst.",
            "Answer the user's question using ONLY the CSV table provided in the message.",
            "Rules:",
            "- Answer concisely, in one or two sentences.",
            "- Quote numbers exactly as they appear in the table.",
            "- If the table cannot answer the question, say so plainly.",
            "- Do not speculate about data that is not in the table.",
        ]
        .join("\n")
    }

    fn user_prompt(input: &AnalysisInput) -> String {
        format!(
            "Question: {}\n\nStock data CSV:\n{}",
            input.question, input.table_csv
        )
    }

    fn response_text(res: &ChatCompletionResponse) -> anyhow::Result<String> {
        let choice = res.choices.first().ok_or_else(|| LlmDiagnosticsError {
            provider: Provider::Groq,
            stage: "empty",
            detail: "response contained no choices".to_string(),
            raw_output: None,
            raw_response_json: None,
        })?;
        Ok(choice.message.content.clone())
    }
}

#[async_trait::async_trait]
impl LlmClient for GroqClient {
    fn provider(&self) -> Provider {
        Provider::Groq
    }

    async fn answer(&self, input: AnalysisInput) -> anyhow::Result<Answer> {
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: Self::system_prompt(),
                },
                Message {
                    role: "user",
                    content: Self::user_prompt(&input),
                },
            ],
        };

        let (raw_json, res) = self.create_chat(req).await?;

        if matches!(
            res.choices.first().and_then(|c| c.finish_reason.as_deref()),
            Some("length")
        ) {
            tracing::warn!(
                question = %input.question,
                max_tokens = self.max_tokens,
                "Groq answer truncated at max_tokens"
            );
        }

        let text = json::normalize_answer(&Self::response_text(&res)?);
        if text.is_empty() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Groq,
                stage: "decode",
                detail: "model returned an empty answer".to_string(),
                raw_output: None,
                raw_response_json: Some(raw_json),
            }
            .into());
        }

        Ok(Answer {
            text,
            raw_response_json: raw_json,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,

    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_chat_completion_body() {
        let body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "AAPL trades at $189.50."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 12}
        });

        let (raw_json, res) = GroqClient::decode_body(&body.to_string()).unwrap();
        assert_eq!(raw_json["id"], "chatcmpl-123");
        assert_eq!(
            GroqClient::response_text(&res).unwrap(),
            "AAPL trades at $189.50."
        );
        assert_eq!(res.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let err = GroqClient::decode_body("<html>bad gateway</html>").unwrap_err();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "decode");
        assert_eq!(diag.raw_output.as_deref(), Some("<html>bad gateway</html>"));
    }

    #[test]
    fn unexpected_response_shape_is_a_decode_error() {
        let err = GroqClient::decode_body(r#"{"choices": "not-an-array"}"#).unwrap_err();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "decode");
        assert!(diag.raw_response_json.is_some());
    }

    #[test]
    fn empty_choices_is_a_diagnostics_error() {
        let res = ChatCompletionResponse { choices: vec![] };
        let err = GroqClient::response_text(&res).unwrap_err();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "empty");
    }

    #[test]
    fn user_prompt_embeds_question_and_table() {
        let input = AnalysisInput {
            question: "highest price?".to_string(),
            table_csv: "Stock Symbol,Price\nAAPL,189.5\n".to_string(),
        };
        let prompt = GroqClient::user_prompt(&input);
        assert!(prompt.contains("highest price?"));
        assert!(prompt.contains("AAPL,189.5"));
    }
}
