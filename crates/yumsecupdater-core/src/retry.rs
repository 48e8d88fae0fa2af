//! Bounded retries with a fixed delay

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Retry an operation up to `attempts` times, sleeping `delay` in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between two attempts
    pub delay: Duration,
    /// Maximum number of invocations, at least one always happens
    pub attempts: u32,
}

impl RetryPolicy {
    /// Wait for yum to release its pid file before exiting: 5 minutes
    pub const IDLE_WAIT: Self = Self::new(Duration::from_secs(10), 30);

    /// Retry a failed update cycle before waiting for the next tick
    pub const CYCLE_RETRY: Self = Self::new(Duration::from_secs(30 * 60), 10);

    #[must_use]
    pub const fn new(delay: Duration, attempts: u32) -> Self {
        Self { delay, attempts }
    }

    /// Run `op` until it succeeds or the attempts are exhausted
    ///
    /// # Errors
    /// Returns the error of the last attempt
    pub async fn retry<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run(None, op).await
    }

    /// Like [`retry`](Self::retry) but gives up during the pause between
    /// attempts once `cancel` fires. A running attempt is never interrupted.
    ///
    /// # Errors
    /// Returns the error of the last attempt that ran
    pub async fn retry_until_cancelled<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run(Some(cancel), op).await
    }

    async fn run<T, E, F, Fut>(&self, cancel: Option<&CancellationToken>, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if attempt >= attempts {
                return Err(err);
            }

            warn!(
                attempt,
                attempts,
                delay = ?self.delay,
                error = %err,
                "attempt failed, retrying"
            );

            match cancel {
                Some(token) => {
                    tokio::select! {
                        () = token.cancelled() => {
                            info!(attempt, "retry cancelled");
                            return Err(err);
                        }
                        () = tokio::time::sleep(self.delay) => {}
                    }
                }
                None => tokio::time::sleep(self.delay).await,
            }

            attempt += 1;
        }
    }
}
