//! Fixed-delay retry for transient fetch failures.

use std::future::Future;
use std::time::Duration;

use core_async::time::sleep;
use core_runtime::config::SyncTuning;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Retry policy with a constant delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; never less than 1
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl From<&SyncTuning> for RetryPolicy {
    fn from(tuning: &SyncTuning) -> Self {
        Self {
            max_attempts: tuning.retry_attempts.max(1),
            delay: tuning.retry_delay,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. `on_retry` sees the attempt number that failed.
    ///
    /// Only the last error is returned; earlier transient failures are
    /// reported through `on_retry` alone.
    pub async fn run<T, Op, Fut, R>(&self, mut operation: Op, mut on_retry: R) -> Result<T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        R: FnMut(u32, &SyncError),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    on_retry(attempt, &err);
                    sleep(self.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
