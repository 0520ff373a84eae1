use std::path::PathBuf;

use clap::Parser;

use crate::types::*;

#[derive(Parser, Debug)]
#[command(
    name = "sitetracker-file-export",
    about = "Export Salesforce file metadata and merge it into a SiteTracker attachment export"
)]
pub struct Cli {
    /// Salesforce CLI org alias
    #[arg(long)]
    pub alias: String,

    /// Login host used if an interactive web login is needed
    #[arg(long, value_enum)]
    pub login_url: Option<LoginUrl>,

    /// Salesforce API version
    #[arg(long, default_value = "60.0")]
    pub api_version: String,

    /// CSV exported from sitetracker__Attachment__c
    #[arg(long)]
    pub sitetracker_csv: PathBuf,

    /// Column holding ContentDocumentId (e.g. sitetracker__ContentDocumentRecord__c)
    #[arg(long)]
    pub docid_col: String,

    /// Output merged CSV (SiteTracker rows with file details)
    #[arg(long, default_value = "merged_sitetracker_files.csv")]
    pub out: PathBuf,

    /// Output CSV of file details only (deduped)
    #[arg(long, default_value = "sitetracker_files_only.csv")]
    pub out_files_only: PathBuf,

    /// Bulk results page size (maxRecords)
    #[arg(long, default_value_t = 50_000, value_parser = clap::value_parser!(u32).range(1..))]
    pub bulk_max_records: u32,

    /// Comma-separated SiteTracker columns to keep (reduces output width)
    #[arg(long)]
    pub sitetracker_columns: Option<String>,

    /// Input CSV encoding label, e.g. utf-8, cp1252, latin-1, utf-16
    /// (default handles UTF-8 with BOM from Excel exports)
    #[arg(long, default_value = "utf-8-sig")]
    pub encoding: String,

    /// Seconds between bulk job status polls
    #[arg(long, default_value_t = 3)]
    pub poll_interval: u64,

    /// Grow the poll interval exponentially up to this many seconds
    #[arg(long)]
    pub poll_max_interval: Option<u64>,

    /// Give up waiting for the bulk job after this many seconds
    #[arg(long)]
    pub max_wait: Option<u64>,

    /// Retries for transient HTTP failures (connection errors, 429, 5xx)
    #[arg(long, default_value_t = 0)]
    pub max_retries: u32,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress spinner
    #[arg(long)]
    pub no_progress_bar: bool,
}
