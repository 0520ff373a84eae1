use std::path::PathBuf;
use std::time::Duration;

use crate::retry::{PollSchedule, RetryConfig};
use crate::loader;
use crate::types::{InputEncoding, LoginUrl};

/// Validated run configuration built from the command line.
#[derive(Debug)]
pub struct Config {
    pub alias: String,
    pub api_version: String,
    pub sitetracker_csv: PathBuf,
    pub docid_col: String,
    pub out: PathBuf,
    pub out_files_only: PathBuf,
    pub sitetracker_columns: Option<Vec<String>>,

    pub poll: PollSchedule,
    pub retry: RetryConfig,

    pub page_size: u32,

    pub login_url: Option<LoginUrl>,
    pub encoding: InputEncoding,

    pub no_progress_bar: bool,
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    if let Some(stripped) = path.to_str().and_then(|p| p.strip_prefix("~/")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path
}

/// Split a comma-separated column list, dropping blank entries.
/// Returns `None` when nothing usable remains.
pub(crate) fn parse_column_list(raw: &str) -> Option<Vec<String>> {
    let columns: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    (!columns.is_empty()).then_some(columns)
}

impl Config {
    pub fn from_cli(cli: crate::cli::Cli) -> anyhow::Result<Self> {
        if cli.docid_col.trim().is_empty() {
            anyhow::bail!("--docid-col must not be empty");
        }
        if cli.poll_interval == 0 {
            anyhow::bail!("--poll-interval must be at least 1 second");
        }
        if let Some(cap) = cli.poll_max_interval {
            if cap < cli.poll_interval {
                anyhow::bail!(
                    "--poll-max-interval ({}s) is shorter than --poll-interval ({}s)",
                    cap,
                    cli.poll_interval
                );
            }
        }

        Ok(Self {
            alias: cli.alias,
            api_version: cli.api_version,
            sitetracker_csv: expand_tilde(cli.sitetracker_csv),
            docid_col: cli.docid_col,
            out: expand_tilde(cli.out),
            out_files_only: expand_tilde(cli.out_files_only),
            sitetracker_columns: cli
                .sitetracker_columns
                .as_deref()
                .and_then(parse_column_list),
            poll: PollSchedule {
                interval: Duration::from_secs(cli.poll_interval),
                max_interval: cli.poll_max_interval.map(Duration::from_secs),
                max_wait: cli.max_wait.map(Duration::from_secs),
            },
            retry: RetryConfig {
                max_retries: cli.max_retries,
                ..RetryConfig::default()
            },
            page_size: cli.bulk_max_records,
            login_url: cli.login_url,
            encoding: loader::resolve_encoding(&cli.encoding)?,
            no_progress_bar: cli.no_progress_bar,
        })
    }
}
