//! sitetracker-file-export: reconcile SiteTracker attachment rows with
//! Salesforce file metadata.
//!
//! Credentials come from the installed Salesforce CLI. Latest `ContentVersion`
//! metadata is pulled with a Bulk API 2.0 query job, filtered to the document
//! ids referenced in the SiteTracker export, and written out as a files-only
//! report plus a left-merged report.

#![warn(clippy::all)]

mod auth;
mod bulk;
mod cli;
mod config;
mod loader;
mod reconcile;
mod report;
pub mod retry;
mod table;
mod types;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use auth::{SfCli, SystemRunner};
use bulk::{BulkClient, HttpSession};
use config::Config;
use report::RunSummary;

async fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let cli = SfCli::discover()?;
    let org = auth::authenticate(
        &SystemRunner,
        &cli,
        &config.alias,
        config.login_url.map(|u| u.as_str()),
    )
    .await?;

    let site_tracker = loader::read_sitetracker_csv(
        &config.sitetracker_csv,
        &config.docid_col,
        config.sitetracker_columns.as_deref(),
        config.encoding,
    )?;
    let docids = reconcile::extract_docids(&site_tracker, &config.docid_col);
    if docids.is_empty() {
        anyhow::bail!("No ContentDocumentIds found in the SiteTracker CSV.");
    }

    let mut summary = RunSummary {
        sitetracker_rows: site_tracker.len(),
        distinct_docids: docids.len(),
        ..RunSummary::default()
    };
    println!("SiteTracker rows loaded: {}", summary.sitetracker_rows);
    println!(
        "Distinct ContentDocumentIds in SiteTracker: {}",
        summary.distinct_docids
    );

    let soql = bulk::build_contentversion_soql();
    tracing::debug!("SOQL: {}", soql);
    println!("Bulk exporting ContentVersion (IsLatest=true)...");
    let session = HttpSession::new(org.access_token.clone())?;
    let client = BulkClient::new(
        Box::new(session),
        &org.instance_url,
        &config.api_version,
        config.retry.clone(),
    )
    .with_progress_bar(!config.no_progress_bar);
    let mut files = client
        .run_query(&soql, &config.poll, config.page_size)
        .await?;

    if files.is_empty() {
        anyhow::bail!("No ContentVersion rows returned. (Permissions? Query All Files?)");
    }
    summary.downloaded_rows = files.len();
    println!("Downloaded ContentVersion rows: {}", summary.downloaded_rows);

    reconcile::add_size_columns(&mut files)?;
    summary.matched_rows = reconcile::filter_to_docids(&mut files, &docids)?;
    println!(
        "Matched ContentVersion rows to SiteTracker docids: {}",
        summary.matched_rows
    );

    summary.duplicates_dropped = reconcile::dedupe_docids(&mut files)?;
    if summary.duplicates_dropped > 0 {
        tracing::debug!(
            "Dropped {} duplicate ContentDocumentId rows",
            summary.duplicates_dropped
        );
    }
    reconcile::add_file_urls(&mut files, &org.instance_url)?;
    report::write_report(&files, &config.out_files_only)
        .context("Failed to write file details report")?;
    println!(
        "Wrote file details only: {}",
        config.out_files_only.display()
    );

    let merged = reconcile::merge_site_tracker_and_files(
        &site_tracker,
        &files,
        &config.docid_col,
        &org.instance_url,
    )?;
    report::write_report(&merged, &config.out).context("Failed to write merged report")?;
    println!("Wrote merged output: {}", config.out.display());
    summary.merged_rows = merged.len();

    summary.missing_size = report::missing_value_count(&merged, reconcile::CONTENT_SIZE_BYTES);
    if let Some(missing) = summary.missing_size {
        println!(
            "Rows with no matched file size (missing/permission/invalid docid): {}",
            missing
        );
    }

    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = Config::from_cli(cli)?;
    tracing::debug!(
        alias = %config.alias,
        api_version = %config.api_version,
        encoding = config.encoding.name(),
        "Starting export"
    );

    let summary = run(&config).await?;
    tracing::info!(
        merged = summary.merged_rows,
        matched = summary.matched_rows,
        sized = ?summary.sized_rows(),
        "Export complete"
    );
    Ok(())
}
