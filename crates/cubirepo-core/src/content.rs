//! # Content Sources
//!
//! Where an artifact's binary payload comes from.
//!
//! - [`StoredContent`]: bytes persisted in the local cache, keyed by the
//!   record identity. Writable and deletable.
//! - [`FetchedContent`]: no owned bytes. Every read performs a live lookup
//!   of the latest stable build through a [`BuildFeed`]. Writes and deletes
//!   are no-ops, and the registry never persists it.
//!
//! Both sit behind [`ContentSource`], which is the only read/write/delete
//! surface the rest of the crate uses.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::store;

/// Live access to the newest artifact published by an external build server.
///
/// Implementations must bound every network call with a timeout and report
/// failures as [`ContentError::Unavailable`]. Implementations hold only
/// static configuration, so a read never touches registry state.
#[async_trait]
pub trait BuildFeed: Send + Sync + std::fmt::Debug {
    /// Download the payload of the latest stable build's matching artifact.
    async fn fetch_latest(&self) -> Result<Vec<u8>, ContentError>;
}

/// Discriminant of a [`ContentSource`], as recorded in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Stored,
    Fetched,
}

/// Payload persisted in the local cache.
#[derive(Debug, Clone)]
pub struct StoredContent {
    path: PathBuf,
    cache: store::ContentStore,
}

impl StoredContent {
    pub(crate) fn new(cache: store::ContentStore, path: PathBuf) -> Self {
        Self { path, cache }
    }

    /// Cache file backing this payload.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Payload fetched live from a build server on every read.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    feed: Arc<dyn BuildFeed>,
}

impl FetchedContent {
    pub fn new(feed: Arc<dyn BuildFeed>) -> Self {
        Self { feed }
    }
}

/// The strategy that supplies an artifact's payload.
#[derive(Debug, Clone)]
pub enum ContentSource {
    Stored(StoredContent),
    Fetched(FetchedContent),
}

impl ContentSource {
    /// Produce the payload bytes.
    ///
    /// Stored content reads its cache file; fetched content performs the
    /// remote lookup. Either failure surfaces as a [`ContentError`].
    pub async fn read(&self) -> Result<Vec<u8>, ContentError> {
        match self {
            Self::Stored(stored) => store::read(&stored.path).await,
            Self::Fetched(fetched) => fetched.feed.fetch_latest().await,
        }
    }

    /// Replace the payload bytes. No-op for fetched content.
    pub fn write(&self, bytes: &[u8]) -> Result<(), ContentError> {
        match self {
            Self::Stored(stored) => stored.cache.write(&stored.path, bytes),
            Self::Fetched(_) => Ok(()),
        }
    }

    /// Delete the payload bytes. No-op for fetched content.
    pub fn delete(&self) -> Result<(), ContentError> {
        match self {
            Self::Stored(stored) => store::remove(&stored.path),
            Self::Fetched(_) => Ok(()),
        }
    }

    /// Cache file of stored content; `None` for fetched content.
    pub fn stored_path(&self) -> Option<&Path> {
        match self {
            Self::Stored(stored) => Some(&stored.path),
            Self::Fetched(_) => None,
        }
    }

    /// Whether a record backed by this source may be deleted.
    pub fn is_deletable(&self) -> bool {
        matches!(self, Self::Stored(_))
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Stored(_) => SourceKind::Stored,
            Self::Fetched(_) => SourceKind::Fetched,
        }
    }
}
