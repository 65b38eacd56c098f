//! Per-call timeouts and bounded retries at the I/O boundary

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::DomainError;

/// I/O settings shared by every collaborator call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoConfig {
    /// Timeout applied to each retrieval, embedding, judge and reformulation call
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Attempts per retrieval, first one included
    #[serde(default = "default_retrieval_max_attempts")]
    pub retrieval_max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

fn default_retrieval_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            retrieval_max_attempts: default_retrieval_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl IoConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.call_timeout_ms == 0 {
            return Err(DomainError::configuration("io.call_timeout_ms must be positive"));
        }
        if self.retrieval_max_attempts == 0 {
            return Err(DomainError::configuration(
                "io.retrieval_max_attempts must be at least 1",
            ));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(DomainError::configuration(
                "io.max_backoff_ms must be >= io.initial_backoff_ms",
            ));
        }
        Ok(())
    }
}

/// Timeout plus exponential backoff for transient errors
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
    call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&IoConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64, call_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff_ms,
            max_backoff_ms: max_backoff_ms.max(initial_backoff_ms),
            call_timeout,
        }
    }

    pub fn from_config(config: &IoConfig) -> Self {
        Self::new(
            config.retrieval_max_attempts,
            config.initial_backoff_ms,
            config.max_backoff_ms,
            Duration::from_millis(config.call_timeout_ms),
        )
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Run one call under the per-call timeout
    pub async fn with_timeout<T, Fut>(&self, operation: &str, call: Fut) -> Result<T, DomainError>
    where
        Fut: Future<Output = Result<T, DomainError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::timeout(
                operation,
                self.call_timeout.as_millis() as u64,
            )),
        }
    }

    /// Run a call with timeout, retrying transient failures
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut call: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;

        loop {
            match self.with_timeout(operation, call()).await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(operation, retries = attempt, "Call succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(operation, attempts = attempt + 1, error = %err, "Giving up after retries");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// min(initial * 2^attempt, max)
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }
}
