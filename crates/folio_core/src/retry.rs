//! Bounded retries for transient store failures.
//!
//! Every store call is idempotent under the compare-and-swap contract, so a
//! `Transient` failure can be replayed verbatim: a write whose first attempt
//! actually landed comes back as `Conflict` (or `AlreadyExists`) on replay
//! instead of applying twice.

use crate::error::{FolioError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles after each one.
    pub initial_backoff: Duration,
    /// Upper bound on a single backoff.
    pub max_backoff: Duration,
    /// Per-attempt deadline. Expiry counts as a transient failure.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Retries without sleeping in between. Used by tests.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            attempt_timeout: None,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Runs `op`, replaying it while it fails with `Transient`.
    ///
    /// Any other error, and the last transient one, is returned unchanged.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0;
        loop {
            let outcome = match self.attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(FolioError::Transient(format!(
                        "{} timed out after {}ms",
                        what,
                        limit.as_millis()
                    ))),
                },
                None => op().await,
            };

            match outcome {
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    retry += 1;
                    let wait = self.backoff(retry);
                    warn!(
                        operation = what,
                        retry,
                        max_retries = self.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        "transient store failure, retrying: {}",
                        e
                    );
                    if !wait.is_zero() {
                        tokio::time::sleep(wait).await;
                    }
                }
                other => return other,
            }
        }
    }
}
