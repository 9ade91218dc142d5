//! Retries driven by the `backoff` crate.

use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::error::SidekickError;

/// Exponential-backoff executor.
///
/// Errors for which the retry condition returns `false` are surfaced immediately;
/// everything else is retried until the backoff's max elapsed time runs out.
#[derive(Debug, Clone)]
pub struct BackoffRetryExecutor {
    backoff: ExponentialBackoff,
    retry_condition: fn(&SidekickError) -> bool,
}

impl Default for BackoffRetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffRetryExecutor {
    /// Executor tuned for the OpenAI API (1s initial, x2, 60s cap, 300s total).
    pub fn new() -> Self {
        Self::with_backoff(default_backoff())
    }

    pub fn with_backoff(backoff: ExponentialBackoff) -> Self {
        Self {
            backoff,
            retry_condition: SidekickError::is_retryable,
        }
    }

    /// Replace the predicate deciding which errors are transient.
    pub fn with_retry_condition(mut self, condition: fn(&SidekickError) -> bool) -> Self {
        self.retry_condition = condition;
        self
    }

    pub fn backoff(&self) -> &ExponentialBackoff {
        &self.backoff
    }

    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, SidekickError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, SidekickError>>,
    {
        let condition = self.retry_condition;
        let operation = &operation;
        backoff::future::retry_notify(
            self.backoff.clone(),
            || async move {
                operation().await.map_err(|err| {
                    if condition(&err) {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            },
            |err: SidekickError, wait: Duration| {
                tracing::debug!(
                    delay_ms = wait.as_millis() as u64,
                    error = %err,
                    "Retrying after transient failure"
                );
            },
        )
        .await
    }
}

fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(1000))
        .with_max_interval(Duration::from_secs(60))
        .with_multiplier(2.0)
        .with_max_elapsed_time(Some(Duration::from_secs(300)))
        .build()
}

/// Retry with the default backoff executor.
pub async fn retry_with_backoff<F, Fut, T>(operation: F) -> Result<T, SidekickError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, SidekickError>>,
{
    BackoffRetryExecutor::new().execute(operation).await
}
