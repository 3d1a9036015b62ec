//! Retry-with-backoff and per-attempt timeout for outbound calls.
//!
//! Every HTTP interaction with an external collaborator goes through a
//! [`RetryPolicy`]: a failed or timed-out attempt is retried up to
//! `max_retries` extra times with jittered exponential backoff, each attempt
//! bounded by a wall-clock budget.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::config::RetryConfig;
use crate::error::RelayError;

/// Outcome of a retried call that never produced a success.
#[derive(Debug, Error)]
pub enum CallError<E: std::fmt::Display> {
    /// The final attempt overran its wall-clock budget.
    #[error("operation `{op}` timed out after {}s", limit.as_secs())]
    Timeout { op: String, limit: Duration },
    /// Every attempt failed; carries the error from the last one.
    #[error("{0}")]
    Failed(E),
}

impl From<CallError<RelayError>> for RelayError {
    fn from(error: CallError<RelayError>) -> Self {
        match error {
            CallError::Timeout { op, limit } => RelayError::Timeout {
                op,
                seconds: limit.as_secs(),
            },
            CallError::Failed(inner) => inner,
        }
    }
}

/// Retry parameters applied to a single logical outbound operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Cap on the backoff sleep between attempts.
    pub max_backoff: Duration,
    /// Wall-clock budget per attempt.
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            max_backoff: cfg.max_backoff(),
            timeout: cfg.timeout(),
        }
    }

    /// Runs `attempt` until it succeeds or the retry budget is exhausted.
    /// `op` names the operation in logs and errors.
    pub async fn call<T, E, F, Fut>(&self, op: &str, mut attempt: F) -> Result<T, CallError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let total_attempts = self.max_retries + 1;

        for attempt_no in 1..=total_attempts {
            let last = attempt_no == total_attempts;
            let remaining_retries = total_attempts - attempt_no;

            match timeout(self.timeout, attempt()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => {
                    if last {
                        tracing::warn!(
                            op,
                            attempts = total_attempts,
                            error = %err,
                            "operation failed, retry budget exhausted"
                        );
                        return Err(CallError::Failed(err));
                    }

                    let backoff = self.backoff_for(remaining_retries);
                    tracing::warn!(
                        op,
                        attempt = attempt_no,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "operation failed, retrying"
                    );
                    sleep(backoff).await;
                }
                Err(_) => {
                    if last {
                        tracing::warn!(
                            op,
                            attempts = total_attempts,
                            "operation timed out, retry budget exhausted"
                        );
                        return Err(CallError::Timeout {
                            op: op.to_string(),
                            limit: self.timeout,
                        });
                    }

                    let backoff = self.backoff_for(remaining_retries);
                    tracing::warn!(
                        op,
                        attempt = attempt_no,
                        backoff_ms = backoff.as_millis() as u64,
                        "operation timed out, retrying"
                    );
                    sleep(backoff).await;
                }
            }
        }

        unreachable!("loop returns on the final attempt")
    }

    /// Jittered exponential backoff keyed to the remaining retry budget,
    /// capped at `max_backoff`: min(2^(remaining - 1) + random[0, 1),
    /// max_backoff).
    fn backoff_for(&self, remaining_retries: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
        let raw = 2f64.powi(remaining_retries.saturating_sub(1) as i32) + jitter;
        Duration::from_secs_f64(raw.min(self.max_backoff.as_secs_f64()))
    }
}
