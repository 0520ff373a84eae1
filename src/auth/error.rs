use thiserror::Error;

/// Failures while obtaining Salesforce credentials from the CLI.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Salesforce CLI not found on PATH. Verify `sf --version` works in this terminal.")]
    CliNotFound,

    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Command failed:\n  {command}\n\nSTDERR:\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Could not extract accessToken/instanceUrl from Salesforce CLI output.")]
    MissingCredentials,

    #[error("Salesforce CLI returned an invalid instance URL {url:?}: {source}")]
    InvalidInstanceUrl {
        url: String,
        source: url::ParseError,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
