use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// One answered (or failed) query, as persisted to the results CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub run_id: Uuid,
    pub asked_at: DateTime<Utc>,
    pub query: String,
    pub response: String,
    pub status: RunStatus,
    pub error: Option<String>,
}

impl AnalysisRecord {
    pub fn success(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            asked_at: Utc::now(),
            query: query.into(),
            response: response.into(),
            status: RunStatus::Success,
            error: None,
        }
    }

    pub fn failure(query: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            run_id: Uuid::new_v4(),
            asked_at: Utc::now(),
            query: query.into(),
            response: String::new(),
            status: RunStatus::Error,
            error: Some(error),
        }
    }
}
