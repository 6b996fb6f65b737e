use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

use crate::config::RetryConfig;
use crate::error::{Result, RouterError};

/// Returned to the user when every attempt was rate limited
pub const RATE_LIMIT_APOLOGY: &str =
    "I'm sorry, I'm experiencing high traffic. Please try again later.";

/// Fixed-interval retry that only reacts to upstream rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitRetry {
    max_attempts: u32,
    backoff: Duration,
}

/// Outcome of a rate-limited call
#[derive(Debug, PartialEq, Eq)]
pub enum Attempted<T> {
    Completed(T),
    Exhausted,
}

impl Default for RateLimitRetry {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(45))
    }
}

impl RateLimitRetry {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(cfg.max_attempts, Duration::from_secs(cfg.rate_limit_backoff_secs))
    }

    /// Run `action` until it succeeds, fails with something other than a rate
    /// limit, or the attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, mut action: F) -> Result<Attempted<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let strategy = FixedInterval::new(self.backoff).take(self.max_attempts as usize - 1);
        let mut attempt = 0u32;
        let max_attempts = self.max_attempts;
        let backoff = self.backoff;

        let outcome = RetryIf::spawn(
            strategy,
            || {
                attempt += 1;
                action()
            },
            |e: &RouterError| {
                let retry = e.is_rate_limited();
                if retry {
                    tracing::warn!(
                        "Rate limited. Waiting {}s before retrying (max {} attempts)",
                        backoff.as_secs(),
                        max_attempts
                    );
                }
                retry
            },
        )
        .await;

        match outcome {
            Ok(value) => Ok(Attempted::Completed(value)),
            Err(e) if e.is_rate_limited() => {
                tracing::warn!("Still rate limited after {} attempts, giving up", attempt);
                Ok(Attempted::Exhausted)
            }
            Err(e) => Err(e),
        }
    }
}
