use std::path::Path;

use async_trait::async_trait;

use super::error::AuthError;

/// Abstraction over subprocess execution so the auth flow can be tested
/// without a real Salesforce CLI installed.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program args...` to completion and return its stdout.
    /// A non-zero exit is reported as [`AuthError::CommandFailed`].
    async fn run(&self, program: &Path, args: &[String]) -> Result<String, AuthError>;
}

/// Runs commands with `tokio::process`, capturing stdout and stderr.
pub struct SystemRunner;

pub(crate) fn command_line(program: &Path, args: &[String]) -> String {
    std::iter::once(program.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<String, AuthError> {
        let command = command_line(program, args);
        tracing::debug!("Running: {}", command);
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::inherit())
            .output()
            .await
            .map_err(|source| AuthError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AuthError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
