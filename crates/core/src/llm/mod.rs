pub mod error;
pub mod groq;
pub mod json;

use crate::domain::stock::StockRecord;
use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
}

/// A question plus the dataset it should be answered from.
///
/// The dataset is rendered once as a compact CSV table and inlined into the
/// prompt, so the model answers from the actual rows rather than from its
/// training data.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub question: String,
    pub table_csv: String,
}

impl AnalysisInput {
    pub fn new(question: impl Into<String>, records: &[StockRecord]) -> anyhow::Result<Self> {
        let question = question.into();
        anyhow::ensure!(!question.trim().is_empty(), "question must be non-empty");
        anyhow::ensure!(!records.is_empty(), "stock dataset is empty");

        let mut wtr = csv::Writer::from_writer(Vec::new());
        for record in records {
            wtr.serialize(record).context("failed to render stock row")?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| anyhow::anyhow!("csv writer flush failed: {e}"))?;
        let table_csv =
            String::from_utf8(bytes).context("rendered table is not valid UTF-8")?;

        Ok(Self {
            question,
            table_csv,
        })
    }
}

/// The provider's answer: normalized text plus the raw response body.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub raw_response_json: serde_json::Value,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn answer(&self, input: AnalysisInput) -> anyhow::Result<Answer>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(symbol: &str) -> StockRecord {
        StockRecord {
            symbol: symbol.to_string(),
            name: format!("{symbol} Corp."),
            sector: "Technology".to_string(),
            price: 100.0,
            pe_ratio: 20.0,
            market_cap_b: 500.0,
            performance_pct: 5.0,
        }
    }

    #[test]
    fn renders_table_with_headers_and_rows() {
        let input = AnalysisInput::new("highest price?", &[record("AAPL"), record("MSFT")]).unwrap();
        let mut lines = input.table_csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Stock Symbol,Company Name,Sector,Price,P/E Ratio,Market Cap (B),Performance (%)"
        );
        assert_eq!(input.table_csv.lines().count(), 3);
        assert!(input.table_csv.contains("MSFT"));
    }

    #[test]
    fn rejects_blank_question_and_empty_dataset() {
        assert!(AnalysisInput::new("  ", &[record("AAPL")]).is_err());
        assert!(AnalysisInput::new("q", &[]).is_err());
    }

    struct CannedLlm {
        reply: &'static str,
    }

    #[async_trait::async_trait]
    impl LlmClient for CannedLlm {
        fn provider(&self) -> Provider {
            Provider::Groq
        }

        async fn answer(&self, _input: AnalysisInput) -> anyhow::Result<Answer> {
            Ok(Answer {
                text: self.reply.to_string(),
                raw_response_json: serde_json::json!({"canned": true}),
            })
        }
    }

    #[tokio::test]
    async fn canned_client_drives_the_query_flow() {
        let llm: Box<dyn LlmClient> = Box::new(CannedLlm {
            reply: "MSFT has the highest price at $402.10.",
        });
        let records = vec![record("AAPL"), record("MSFT")];

        let input = AnalysisInput::new("Which stock has the highest price?", &records).unwrap();
        let answer = llm.answer(input).await.unwrap();

        let path =
            std::env::temp_dir().join(format!("stocksense_flow_{}.csv", uuid::Uuid::new_v4()));
        let record = crate::storage::results::append_success(
            &path,
            "Which stock has the highest price?",
            &answer.text,
        )
        .unwrap();

        assert_eq!(record.response, "MSFT has the highest price at $402.10.");
        let rows = crate::storage::results::load_results(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].query, "Which stock has the highest price?");

        std::fs::remove_file(&path).ok();
    }

    struct FailingLlm;

    #[async_trait::async_trait]
    impl LlmClient for FailingLlm {
        fn provider(&self) -> Provider {
            Provider::Groq
        }

        async fn answer(&self, _input: AnalysisInput) -> anyhow::Result<Answer> {
            Err(crate::llm::error::LlmDiagnosticsError {
                provider: Provider::Groq,
                stage: "http",
                detail: "status=401 Unauthorized".to_string(),
                raw_output: Some(r#"{"error":{"message":"invalid api key"}}"#.to_string()),
                raw_response_json: None,
            }
            .into())
        }
    }

    #[tokio::test]
    async fn failed_runs_keep_the_raw_provider_payload_on_record() {
        let llm: Box<dyn LlmClient> = Box::new(FailingLlm);
        let records = vec![record("AAPL")];

        let input = AnalysisInput::new("What is the stock price of AAPL?", &records).unwrap();
        let err = llm.answer(input).await.unwrap_err();

        let path =
            std::env::temp_dir().join(format!("stocksense_fail_{}.csv", uuid::Uuid::new_v4()));
        crate::storage::results::append_failure(
            &path,
            "What is the stock price of AAPL?",
            &crate::llm::error::persisted_detail(&err),
        )
        .unwrap();

        let rows = crate::storage::results::load_results(&path).unwrap();
        assert_eq!(rows.len(), 1);
        let detail = rows[0].error.as_deref().unwrap();
        assert!(detail.contains("stage=http"));
        assert!(detail.contains("invalid api key"));

        std::fs::remove_file(&path).ok();
    }
}
