use thiserror::Error;

use crate::table::TableError;

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("Bulk job creation failed HTTP {status}:\n{body}\nSOQL:\n{soql}")]
    CreateJob {
        status: u16,
        body: String,
        soql: String,
    },

    #[error("{context} failed HTTP {status}:\n{body}")]
    Status {
        context: &'static str,
        status: u16,
        body: String,
    },

    #[error("Bulk job ended in state {state}: {payload}")]
    JobFailed { state: String, payload: String },

    #[error("Bulk job {job_id} still {state} after waiting {waited_secs}s")]
    Timeout {
        job_id: String,
        state: String,
        waited_secs: u64,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed results page: {0}")]
    Table(#[from] TableError),
}

impl BulkError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::CreateJob { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Connection failures, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        if let Self::Http(e) = self {
            if e.is_connect() || e.is_timeout() {
                return true;
            }
        }
        self.status()
            .is_some_and(|s| s == 429 || (500..600).contains(&s))
    }
}
