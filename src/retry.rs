//! Backoff schedules for transport retries and bulk job polling.

use std::future::Future;
use std::time::Duration;

use rand::Rng as _;

/// Retry decision returned by the error classifier callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Retry,
    Abort,
}

/// Exponential backoff with jitter for individual HTTP requests.
///
/// `max_retries = 0` means every request is attempted exactly once.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_secs: 2,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (0-indexed):
    /// `min(base * 2^retry, max) + jitter(0..base)`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exp_delay = self
            .base_delay_secs
            .saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX));
        let capped = exp_delay.min(self.max_delay_secs);
        let jitter = if self.base_delay_secs > 0 {
            rand::thread_rng().gen_range(0..self.base_delay_secs)
        } else {
            0
        };
        Duration::from_secs(capped + jitter)
    }
}

/// Run `operation` until it succeeds, the classifier aborts, or retries run out.
/// The last error is returned unchanged.
pub async fn retry_with_backoff<F, Fut, T, E, C>(
    config: &RetryConfig,
    classifier: C,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryAction,
    E: std::fmt::Display,
{
    let total_attempts = config.max_retries + 1;
    let mut attempt = 0;
    loop {
        let err = match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => e,
        };
        attempt += 1;
        if attempt >= total_attempts || classifier(&err) == RetryAction::Abort {
            return Err(err);
        }
        let delay = config.delay_for_retry(attempt - 1);
        tracing::warn!(
            "Transient error (attempt {}/{}), retrying in {}s: {}",
            attempt,
            total_attempts,
            delay.as_secs(),
            err
        );
        tokio::time::sleep(delay).await;
    }
}

/// Schedule for polling a bulk job until it reaches a terminal state.
///
/// Without `max_interval` every poll waits `interval`; with it the wait doubles
/// per poll up to the cap. Without `max_wait` polling never gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_interval: Option<Duration>,
    pub max_wait: Option<Duration>,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_interval: None,
            max_wait: None,
        }
    }
}

impl PollSchedule {
    /// Wait after the `poll`-th non-terminal status (0-indexed).
    pub fn delay_for_poll(&self, poll: u32) -> Duration {
        match self.max_interval {
            None => self.interval,
            Some(cap) => {
                let factor = 1u32.checked_shl(poll).unwrap_or(u32::MAX);
                self.interval.saturating_mul(factor).min(cap.max(self.interval))
            }
        }
    }

    /// Whether sleeping `next_delay` more would overrun `max_wait`.
    pub fn would_exceed(&self, waited: Duration, next_delay: Duration) -> bool {
        self.max_wait
            .is_some_and(|limit| waited.saturating_add(next_delay) > limit)
    }
}
