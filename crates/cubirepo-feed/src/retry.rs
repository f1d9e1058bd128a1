//! Retry policy for build feed requests.
//!
//! Only a refused or unreachable build server is retried, with exponential
//! backoff. A request that hit the client timeout is returned at once: the
//! server answered too slowly, and another full timeout would only stretch
//! the download request waiting on it. Non-2xx statuses and undecodable
//! bodies are never retried.

use std::future::Future;
use std::time::Duration;

/// Default number of attempts per request, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry; doubled for each further retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// How often, and how patiently, one build feed request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, the first one included. `0` behaves as `1`.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based): base, 2×base, 4×base.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << retry.min(16))
    }

    /// Time spent sleeping when every attempt of one request fails.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|retry| self.backoff(retry))
            .sum()
    }

    /// Run `send` until it succeeds, fails with a non-retryable error, or
    /// the attempts are used up. The caller inspects the status code.
    pub(crate) async fn send<F, Fut>(
        &self,
        endpoint: &str,
        send: F,
    ) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 1;
        loop {
            match send().await {
                Err(e) if attempt < self.max_attempts && is_retryable(&e) => {
                    let delay = self.backoff(attempt - 1);
                    tracing::warn!(
                        endpoint,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "build server unreachable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Connection failures are retried; timeouts are not.
pub(crate) fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_connect() && !err.is_timeout()
}
