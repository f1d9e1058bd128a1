//! Build feed error types.

use std::time::Duration;

use cubirepo_core::ContentError;

/// Errors from build feed calls.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP transport error, including timeouts.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The build server returned a non-2xx status.
    #[error("build server {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The project has no stable build yet.
    #[error("project has no stable build")]
    NoStableBuild,
    /// The latest stable build has no artifact with the configured prefix.
    #[error("no artifact starting with '{prefix}' in build {build_url}")]
    NoMatchingArtifact { prefix: String, build_url: String },
    /// A URL returned by the build server could not be used.
    #[error("invalid URL from build server: {0}")]
    InvalidUrl(String),
    /// The whole lookup outlived `FeedConfig::fetch_deadline`.
    #[error("build feed lookup exceeded its {deadline:?} deadline")]
    DeadlineExceeded { deadline: Duration },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl From<FeedError> for ContentError {
    fn from(err: FeedError) -> Self {
        ContentError::Unavailable(err.to_string())
    }
}
