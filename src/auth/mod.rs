//! Salesforce credentials obtained by delegating to the installed CLI.
//!
//! The CLI owns the OAuth dance and token storage; this module only asks it
//! for the current org's token, falling back to one interactive web login.

pub mod cli_tool;
pub mod error;
pub mod responses;
pub mod runner;

use url::Url;

pub use self::cli_tool::SfCli;
use self::error::AuthError;
use self::responses::OrgDisplayResponse;
pub use self::runner::{CommandRunner, SystemRunner};

/// Bearer token plus the org's instance base URL (no trailing slash).
#[derive(Clone)]
pub struct OrgAuth {
    pub access_token: String,
    pub instance_url: String,
}

impl std::fmt::Debug for OrgAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgAuth")
            .field("access_token", &"<redacted>")
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

async fn org_display(
    runner: &dyn CommandRunner,
    cli: &SfCli,
    alias: &str,
) -> Result<OrgDisplayResponse, AuthError> {
    let stdout = runner.run(&cli.program, &cli.display_args(alias)).await?;
    Ok(serde_json::from_str(&stdout)?)
}

fn extract_credentials(resp: OrgDisplayResponse) -> Result<OrgAuth, AuthError> {
    let result = resp.result.ok_or(AuthError::MissingCredentials)?;
    let access_token = result
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingCredentials)?;
    let instance_url = result
        .instance_url
        .filter(|u| !u.is_empty())
        .ok_or(AuthError::MissingCredentials)?;

    Url::parse(&instance_url).map_err(|source| AuthError::InvalidInstanceUrl {
        url: instance_url.clone(),
        source,
    })?;

    if let Some(username) = result.username.as_deref() {
        tracing::debug!("Authenticated as {}", username);
    }

    Ok(OrgAuth {
        access_token,
        instance_url: instance_url.trim_end_matches('/').to_string(),
    })
}

/// Resolve credentials for `alias`.
///
/// 1. Runs the CLI's org display command.
/// 2. If that fails or prints unparseable JSON, runs the web login
///    (forwarding `login_url` when given) and displays once more.
/// 3. Requires a non-empty token and instance URL in the final response.
pub async fn authenticate(
    runner: &dyn CommandRunner,
    cli: &SfCli,
    alias: &str,
    login_url: Option<&str>,
) -> Result<OrgAuth, AuthError> {
    let resp = match org_display(runner, cli, alias).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::info!("No usable session for org '{}', starting web login", alias);
            tracing::debug!("org display failed: {}", e);
            runner
                .run(&cli.program, &cli.login_args(alias, login_url))
                .await?;
            org_display(runner, cli, alias).await?
        }
    };
    let auth = extract_credentials(resp)?;
    tracing::debug!("Using instance {}", auth.instance_url);
    Ok(auth)
}
