//! Build feed configuration.
//!
//! Points the client at one build-server project. Override via environment
//! variables or explicit construction for testing.

use std::time::Duration;

use url::Url;

use crate::retry::RetryPolicy;

/// Default filename prefix of the artifact to serve from a build.
pub const DEFAULT_ARTIFACT_PREFIX: &str = "server";

/// Default directory, under a build's `artifact/`, that holds the outputs.
pub const DEFAULT_ARTIFACT_DIR: &str = "out";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Requests in one lookup: project, build, artifact download.
pub const LOOKUP_STEPS: u32 = 3;

/// Configuration for the build feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Project URL on the build server, e.g. `https://ci.example.com/job/Server/`.
    /// Always normalized to end with `/`.
    pub project_url: Url,
    /// Case-insensitive filename prefix selecting the artifact in a build.
    pub artifact_prefix: String,
    /// Directory under `{build}/artifact/` the artifact is served from.
    pub artifact_dir: String,
    /// Timeout applied to each HTTP request, in seconds.
    pub timeout_secs: u64,
    /// Retries of refused connections. Timed-out requests are never retried.
    pub retry: RetryPolicy,
}

impl FeedConfig {
    /// Configuration for a project URL with default prefix, directory and timeout.
    pub fn new(project_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            project_url: parse_base_url("project_url", project_url)?,
            artifact_prefix: DEFAULT_ARTIFACT_PREFIX.to_string(),
            artifact_dir: DEFAULT_ARTIFACT_DIR.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CUBIREPO_FEED_URL` (required)
    /// - `CUBIREPO_FEED_PREFIX` (default: `server`)
    /// - `CUBIREPO_FEED_ARTIFACT_DIR` (default: `out`)
    /// - `CUBIREPO_FEED_TIMEOUT_SECS` (default: 30)
    /// - `CUBIREPO_FEED_MAX_ATTEMPTS` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("CUBIREPO_FEED_URL").map_err(|_| ConfigError::MissingUrl)?;
        let mut config = Self::new(&raw)?;
        if let Ok(prefix) = std::env::var("CUBIREPO_FEED_PREFIX") {
            config.artifact_prefix = prefix;
        }
        if let Ok(dir) = std::env::var("CUBIREPO_FEED_ARTIFACT_DIR") {
            config.artifact_dir = dir;
        }
        config.timeout_secs = std::env::var("CUBIREPO_FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if let Some(attempts) = std::env::var("CUBIREPO_FEED_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.retry.max_attempts = attempts;
        }
        Ok(config)
    }

    /// Configuration pointing at a local mock server (for testing).
    pub fn local_mock(base: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new(base)?;
        config.timeout_secs = 2;
        config.retry.base_delay = Duration::from_millis(20);
        Ok(config)
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Upper bound on one full lookup, enforced by the client.
    ///
    /// A timed-out request is not retried and a refused connection fails
    /// fast, so each step costs at most one request timeout plus the retry
    /// backoff: `LOOKUP_STEPS * (timeout + total_backoff)`, `3 * 30.75s`
    /// with the defaults. A lookup still running at the deadline is
    /// abandoned with `FeedError::DeadlineExceeded`.
    pub fn fetch_deadline(&self) -> Duration {
        let per_step = self.timeout().saturating_add(self.retry.total_backoff());
        per_step.saturating_mul(LOOKUP_STEPS)
    }
}

/// Parse a URL that later relative joins are resolved against.
pub(crate) fn parse_base_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(field.to_string(), e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CUBIREPO_FEED_URL environment variable is required")]
    MissingUrl,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
