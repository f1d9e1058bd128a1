//! # Content Cache
//!
//! Filesystem layout for stored artifact payloads. Each stored record owns
//! exactly one file under the cache root, named after its identity:
//! `cache/{name}_{author}_{version}.{extension}`.

use std::path::{Path, PathBuf};

use crate::error::ContentError;
use crate::identity::ArtifactId;

/// Directory name of the payload cache under the data directory.
pub const CACHE_DIR_NAME: &str = "cache";

/// A payload cache backed by the filesystem.
#[derive(Debug, Clone)]
pub struct ContentStore {
    /// Root directory of the cache (e.g., `./cache`).
    root: PathBuf,
}

impl ContentStore {
    /// Create a cache rooted at the given directory. The directory is
    /// created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the cache path for an artifact's payload.
    pub fn artifact_path(&self, id: &ArtifactId, extension: &str) -> PathBuf {
        self.root.join(id.cache_file_name(extension))
    }

    /// Write a payload, creating the cache directory if needed.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), ContentError> {
        std::fs::create_dir_all(&self.root).map_err(|source| ContentError::Io {
            path: self.root.clone(),
            source,
        })?;
        std::fs::write(path, bytes).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Read a cached payload.
pub(crate) async fn read(path: &Path) -> Result<Vec<u8>, ContentError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Remove a cached payload. A file that is already gone is not an error.
pub(crate) fn remove(path: &Path) -> Result<(), ContentError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ContentError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
