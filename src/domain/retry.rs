//! Bounded retry with exponential backoff for transient backend failures

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::DomainError;

/// Retry policy for idempotent backend calls
///
/// Only errors reported as transient by [`DomainError::is_transient`] are
/// retried. Never wrap a non-idempotent call such as a storage insert.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 50,
            max_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// A policy that makes exactly one attempt
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_initial_delay(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    pub fn with_max_delay(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given retry number (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.initial_delay_ms.min(self.max_delay_ms));
        }

        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;

        Duration::from_millis(delay_ms)
    }

    /// Runs `operation` until it succeeds, fails permanently, or retries run out
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        name: &str,
        mut operation: F,
    ) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        operation = name,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient backend failure, retrying"
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(DomainError::cancelled(format!(
                                "{} cancelled while backing off",
                                name
                            )));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }

                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
