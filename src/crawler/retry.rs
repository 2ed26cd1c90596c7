//! Fixed-delay retry policy
//!
//! A [`RetryPolicy`] is a plain value: how many attempts, how long to pause
//! between them, and which errors deserve another attempt. It is applied
//! explicitly around each network call.

use crate::config::RetryConfig;
use crate::HarvestError;
use std::future::Future;
use std::time::Duration;

/// Default total attempts per call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts
pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

/// Bounded retry with a fixed delay and no backoff or jitter
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    retryable: fn(&HarvestError) -> bool,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.delay_secs))
    }
}

impl RetryPolicy {
    /// Creates a policy that retries transient network errors only
    ///
    /// `max_attempts` counts the first call; zero is treated as one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retryable: HarvestError::is_transient,
        }
    }

    /// Replaces the predicate deciding which errors are retried
    pub fn with_predicate(mut self, retryable: fn(&HarvestError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns true if `error` on attempt number `attempt` (1-based) should be retried
    pub fn should_retry(&self, error: &HarvestError, attempt: u32) -> bool {
        attempt < self.max_attempts && (self.retryable)(error)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts
    ///
    /// The pause between attempts blocks the caller; nothing else runs in
    /// the meantime. On exhaustion the last error is returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use book_harvester::crawler::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), book_harvester::HarvestError> {
    /// let policy = RetryPolicy::new(3, Duration::from_secs(10));
    /// let answer = policy.run(|| async { Ok(42) }).await?;
    /// assert_eq!(answer, 42);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, HarvestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if self.should_retry(&error, attempt) => {
                    tracing::warn!(
                        "Attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        error,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
