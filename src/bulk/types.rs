use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /jobs/query`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest<'a> {
    pub operation: &'static str,
    pub query: &'a str,
    pub content_type: &'static str,
    pub column_delimiter: &'static str,
    pub line_ending: &'static str,
}

impl<'a> CreateJobRequest<'a> {
    pub fn csv_query(query: &'a str) -> Self {
        Self {
            operation: "query",
            query,
            content_type: "CSV",
            column_delimiter: "COMMA",
            line_ending: "LF",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateJobResponse {
    pub id: String,
}

/// Lifecycle states of a Bulk API 2.0 query job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    UploadComplete,
    InProgress,
    JobComplete,
    Failed,
    Aborted,
    Other(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::JobComplete | Self::Failed | Self::Aborted)
    }
}

impl From<&str> for JobState {
    fn from(s: &str) -> Self {
        match s {
            "UploadComplete" => Self::UploadComplete,
            "InProgress" => Self::InProgress,
            "JobComplete" => Self::JobComplete,
            "Failed" => Self::Failed,
            "Aborted" => Self::Aborted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::UploadComplete => "UploadComplete",
            Self::InProgress => "InProgress",
            Self::JobComplete => "JobComplete",
            Self::Failed => "Failed",
            Self::Aborted => "Aborted",
            Self::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// Response from `GET /jobs/query/{id}`. The full payload is kept so a
/// failed job can be reported verbatim.
#[derive(Debug, Clone)]
pub struct JobInfo {
    pub state: JobState,
    pub number_records_processed: Option<u64>,
    pub raw: Value,
}

impl JobInfo {
    pub fn from_value(raw: Value) -> Self {
        let state = raw
            .get("state")
            .and_then(Value::as_str)
            .map(JobState::from)
            .unwrap_or_else(|| JobState::Other("<missing>".to_string()));
        let number_records_processed = raw.get("numberRecordsProcessed").and_then(Value::as_u64);
        Self {
            state,
            number_records_processed,
            raw,
        }
    }
}
