//! Bulk API 2.0 query client: create a CSV query job, poll it to a terminal
//! state, then page through the results with the `Sforce-Locator` cursor.

pub mod error;
pub mod query;
pub mod session;
pub mod types;

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::retry::{self, PollSchedule, RetryAction, RetryConfig};
use crate::table::Table;

pub use self::error::BulkError;
pub use self::query::build_contentversion_soql;
use self::session::HttpResponse;
pub use self::session::{BulkSession, HttpSession};
use self::types::{CreateJobRequest, CreateJobResponse, JobInfo, JobState};

/// Whether the locator header says another page follows.
fn has_more(locator: &str) -> bool {
    !locator.is_empty() && !locator.eq_ignore_ascii_case("null")
}

/// Returns `ProgressBar::hidden()` when disabled or stdout is not a TTY.
fn create_spinner(no_progress_bar: bool) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub struct BulkClient {
    session: Box<dyn BulkSession>,
    jobs_url: String,
    retry: RetryConfig,
    no_progress_bar: bool,
}

impl BulkClient {
    pub fn new(
        session: Box<dyn BulkSession>,
        instance_url: &str,
        api_version: &str,
        retry: RetryConfig,
    ) -> Self {
        Self {
            session,
            jobs_url: format!(
                "{}/services/data/v{}/jobs/query",
                instance_url.trim_end_matches('/'),
                api_version
            ),
            retry,
            no_progress_bar: true,
        }
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.no_progress_bar = !enabled;
        self
    }

    async fn get_checked(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: &str,
        context: &'static str,
    ) -> Result<HttpResponse, BulkError> {
        retry::retry_with_backoff(
            &self.retry,
            |e: &BulkError| {
                if e.is_retryable() {
                    RetryAction::Retry
                } else {
                    RetryAction::Abort
                }
            },
            || async {
                let resp = self.session.get(url, query, accept).await?;
                if resp.is_error() {
                    return Err(BulkError::Status {
                        context,
                        status: resp.status,
                        body: resp.body,
                    });
                }
                Ok(resp)
            },
        )
        .await
    }

    /// Submit `soql` as a CSV query job and return the job id.
    pub async fn create_job(&self, soql: &str) -> Result<String, BulkError> {
        let body = serde_json::to_value(CreateJobRequest::csv_query(soql))?;
        let resp = retry::retry_with_backoff(
            &self.retry,
            |e: &BulkError| {
                if e.is_retryable() {
                    RetryAction::Retry
                } else {
                    RetryAction::Abort
                }
            },
            || async {
                let resp = self.session.post_json(&self.jobs_url, &body).await?;
                if resp.is_error() {
                    return Err(BulkError::CreateJob {
                        status: resp.status,
                        body: resp.body,
                        soql: soql.to_string(),
                    });
                }
                Ok(resp)
            },
        )
        .await?;

        let created: CreateJobResponse = serde_json::from_str(&resp.body)?;
        tracing::debug!("Created bulk query job {}", created.id);
        Ok(created.id)
    }

    /// Poll the job until it completes. `Failed` and `Aborted` are errors;
    /// every other state, known or not, keeps polling.
    pub async fn wait_for_completion(
        &self,
        job_id: &str,
        schedule: &PollSchedule,
    ) -> Result<JobInfo, BulkError> {
        let url = format!("{}/{}", self.jobs_url, job_id);
        let pb = create_spinner(self.no_progress_bar);
        let mut waited = Duration::ZERO;
        let mut poll = 0u32;

        let info = loop {
            let resp = self
                .get_checked(&url, &[], "application/json", "Bulk job status")
                .await?;
            let info = JobInfo::from_value(serde_json::from_str(&resp.body)?);
            pb.set_message(format!("Bulk job {}: {}", job_id, info.state));
            tracing::debug!("Bulk job {} state: {}", job_id, info.state);

            if info.state.is_terminal() {
                break info;
            }

            let delay = schedule.delay_for_poll(poll);
            if schedule.would_exceed(waited, delay) {
                pb.finish_and_clear();
                return Err(BulkError::Timeout {
                    job_id: job_id.to_string(),
                    state: info.state.to_string(),
                    waited_secs: waited.as_secs(),
                });
            }
            tokio::time::sleep(delay).await;
            waited += delay;
            poll += 1;
        };
        pb.finish_and_clear();

        if info.state != JobState::JobComplete {
            return Err(BulkError::JobFailed {
                state: info.state.to_string(),
                payload: info.raw.to_string(),
            });
        }
        if let Some(n) = info.number_records_processed {
            tracing::debug!("Bulk job {} processed {} records", job_id, n);
        }
        Ok(info)
    }

    /// Page through the job's CSV results, `page_size` records at a time,
    /// and concatenate them in arrival order.
    pub async fn fetch_results(&self, job_id: &str, page_size: u32) -> Result<Table, BulkError> {
        let url = format!("{}/{}/results", self.jobs_url, job_id);
        let pb = create_spinner(self.no_progress_bar);
        let mut locator: Option<String> = None;
        let mut pages: Vec<Table> = Vec::new();
        let mut rows = 0usize;

        loop {
            let mut query = vec![("maxRecords", page_size.to_string())];
            if let Some(loc) = &locator {
                query.push(("locator", loc.clone()));
            }
            let resp = self
                .get_checked(&url, &query, "text/csv", "Bulk results fetch")
                .await?;

            if !resp.body.trim().is_empty() {
                let page = Table::from_csv_str(&resp.body)?;
                rows += page.len();
                pages.push(page);
            }
            pb.set_message(format!("Fetched {} rows ({} pages)", rows, pages.len()));

            locator = resp.locator.filter(|l| has_more(l));
            if locator.is_none() {
                break;
            }
        }
        pb.finish_and_clear();
        tracing::debug!("Fetched {} result rows in {} pages", rows, pages.len());

        Ok(Table::concat(pages))
    }

    /// Create, wait for, and download a query job.
    pub async fn run_query(
        &self,
        soql: &str,
        schedule: &PollSchedule,
        page_size: u32,
    ) -> Result<Table, BulkError> {
        let job_id = self.create_job(soql).await?;
        self.wait_for_completion(&job_id, schedule).await?;
        self.fetch_results(&job_id, page_size).await
    }
}
