use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Run `operation` until it succeeds or the attempts are used up
    ///
    /// Every failure is logged as a warning. On exhaustion the last error is
    /// returned; there is no delay after the final attempt.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("✓ {} succeeded after {} attempts", what, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!("❌ {} failed: {} (attempt {}/{})", what, e, attempt, attempts);

                    if attempt >= attempts {
                        return Err(e);
                    }
                    attempt += 1;
                    sleep(self.delay).await;
                }
            }
        }
    }
}
