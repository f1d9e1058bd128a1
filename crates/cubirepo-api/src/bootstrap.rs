//! # Registry Bootstrap
//!
//! Builds the application state at process start.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Prepare data directory**: create `data_dir` and its `cache/`.
//! 2. **Restore registry**: load `cubirepo.dat`; a missing or unreadable
//!    snapshot starts an empty registry (logged).
//! 3. **Register the live feed**: when a build feed is configured, append
//!    the fixed `cubition/server@latest` record backed by it. This record is
//!    never persisted.

use std::sync::Arc;

use cubirepo_core::{ArtifactId, ArtifactRecord};
use cubirepo_feed::{BuildFeedClient, FeedConfig, FeedError};

use crate::state::{registry_in, AppConfig, AppState};

/// Identity of the record served from the build feed.
pub const FEED_AUTHOR: &str = "cubition";
pub const FEED_NAME: &str = "server";
pub const FEED_VERSION: &str = "latest";
pub const FEED_EXTENSION: &str = "jar";
pub const FEED_MAIN_CLASS: &str = "net.cubition.server.ServerBaseController";

/// Errors during bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The data directory could not be prepared.
    #[error("data directory {path} is not usable: {source}")]
    DataDir {
        path: String,
        source: std::io::Error,
    },

    /// The build feed client could not be created.
    #[error("build feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Restore the registry under `config.data_dir` and register the build feed
/// record if a feed is configured.
pub fn bootstrap(config: AppConfig, feed: Option<FeedConfig>) -> Result<AppState, BootstrapError> {
    let cache_dir = config.cache_dir();
    std::fs::create_dir_all(&cache_dir).map_err(|source| BootstrapError::DataDir {
        path: cache_dir.display().to_string(),
        source,
    })?;

    let registry = registry_in(&config.data_dir, true);

    match feed {
        Some(feed_config) => {
            tracing::info!(
                project = %feed_config.project_url,
                prefix = %feed_config.artifact_prefix,
                timeout_secs = feed_config.timeout_secs,
                "build feed configured"
            );
            let client = BuildFeedClient::new(feed_config)?;
            registry.add(feed_record(Arc::new(client)));
        }
        None => {
            tracing::info!("no build feed configured; {FEED_AUTHOR}/{FEED_NAME}@{FEED_VERSION} will not be served");
        }
    }

    tracing::info!(
        data_dir = %config.data_dir.display(),
        records = registry.len(),
        "registry ready"
    );
    Ok(AppState::new(config, registry))
}

/// The fixed record served live from a build feed.
pub fn feed_record(feed: Arc<dyn cubirepo_core::BuildFeed>) -> ArtifactRecord {
    ArtifactRecord::fetched(
        ArtifactId::new(FEED_AUTHOR, FEED_NAME, FEED_VERSION),
        FEED_EXTENSION,
        Some(FEED_MAIN_CLASS.to_string()),
        feed,
    )
}
