//! # cubirepo-feed -- Build Server Feed Client
//!
//! Typed access to a build server project, used to serve "the latest stable
//! build" as a registry artifact without ever storing it.
//!
//! ## Lookup
//!
//! 1. `GET {project}/api/json` yields the latest stable build URL.
//! 2. `GET {build}/api/json` lists the build's artifacts; the first whose
//!    file name starts with the configured prefix is chosen.
//! 3. `GET {build}/artifact/{dir}/{fileName}` downloads it.
//!
//! Every request carries the configured timeout. Refused connections are
//! retried per [`retry::RetryPolicy`]; a timeout, a non-2xx status or a bad
//! body fails the lookup at once. The whole lookup is capped at
//! [`FeedConfig::fetch_deadline`], `3 * (timeout + backoff)`, about 92s with
//! the defaults. At the registry boundary all failures become
//! `ContentError::Unavailable`.

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::FeedConfig;
pub use error::FeedError;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use cubirepo_core::{BuildFeed, ContentError};
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{BuildDescription, ProjectDescription};

/// Client for one build server project.
#[derive(Debug, Clone)]
pub struct BuildFeedClient {
    http: reqwest::Client,
    config: FeedConfig,
}

impl BuildFeedClient {
    /// Create a client from configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FeedError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// URL of the project's latest stable build, normalized to end with `/`.
    pub async fn latest_stable_build(&self) -> Result<Url, FeedError> {
        let url = join(&self.config.project_url, "api/json")?;
        let project: ProjectDescription = self.get_json("GET project/api/json", url).await?;
        let build = project.last_stable_build.ok_or(FeedError::NoStableBuild)?;
        config::parse_base_url("lastStableBuild.url", &build.url)
            .map_err(|e| FeedError::InvalidUrl(e.to_string()))
    }

    /// URL of the artifact in `build_url` matching the configured prefix.
    pub async fn find_artifact(&self, build_url: &Url) -> Result<Url, FeedError> {
        let url = join(build_url, "api/json")?;
        let build: BuildDescription = self.get_json("GET build/api/json", url).await?;
        let artifact = build
            .find_by_prefix(&self.config.artifact_prefix)
            .ok_or_else(|| FeedError::NoMatchingArtifact {
                prefix: self.config.artifact_prefix.clone(),
                build_url: build_url.to_string(),
            })?;
        join(
            build_url,
            &format!(
                "artifact/{}/{}",
                self.config.artifact_dir.trim_matches('/'),
                artifact.file_name
            ),
        )
    }

    /// Resolve and download the latest stable build's artifact within
    /// [`FeedConfig::fetch_deadline`].
    pub async fn fetch_latest_artifact(&self) -> Result<Vec<u8>, FeedError> {
        let deadline = self.config.fetch_deadline();
        tokio::time::timeout(deadline, self.lookup_latest_artifact())
            .await
            .map_err(|_| FeedError::DeadlineExceeded { deadline })?
    }

    async fn lookup_latest_artifact(&self) -> Result<Vec<u8>, FeedError> {
        let build_url = self.latest_stable_build().await?;
        let artifact_url = self.find_artifact(&build_url).await?;
        tracing::debug!(url = %artifact_url, "downloading latest stable artifact");

        let endpoint = "GET build/artifact";
        let resp = self.send(endpoint, artifact_url).await?;
        let bytes = resp.bytes().await.map_err(|e| FeedError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: Url) -> Result<T, FeedError> {
        let resp = self.send(endpoint, url).await?;
        resp.json().await.map_err(|e| FeedError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }

    async fn send(&self, endpoint: &str, url: Url) -> Result<reqwest::Response, FeedError> {
        let resp = self
            .config
            .retry
            .send(endpoint, || self.http.get(url.clone()).send())
            .await
            .map_err(|e| FeedError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl BuildFeed for BuildFeedClient {
    async fn fetch_latest(&self) -> Result<Vec<u8>, ContentError> {
        self.fetch_latest_artifact().await.map_err(|e| {
            tracing::warn!(
                project = %self.config.project_url,
                error = %e,
                "build feed lookup failed"
            );
            ContentError::from(e)
        })
    }
}

fn join(base: &Url, relative: &str) -> Result<Url, FeedError> {
    base.join(relative)
        .map_err(|e| FeedError::InvalidUrl(format!("{base} + {relative}: {e}")))
}
