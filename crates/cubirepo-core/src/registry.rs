//! # Registry
//!
//! Ordered, in-memory collection of [`ArtifactRecord`]s with a snapshot on
//! disk that is loaded once at startup and rewritten after every mutation.
//!
//! ## Concurrency
//!
//! Lookups take the read lock only long enough to clone the matching
//! `Arc`s, so a slow fetched read never blocks the registry. Mutations take
//! the write lock and rewrite the snapshot before releasing it, so two
//! uploads cannot interleave a partial snapshot. Snapshot writes are also
//! serialized by their own mutex for explicit [`Registry::persist`] calls.
//!
//! ## Durability
//!
//! - A missing snapshot starts an empty registry.
//! - An unreadable or undecodable snapshot is logged and also starts an
//!   empty registry; the next successful save overwrites it.
//! - A failed save after a mutation is logged and the in-memory mutation is
//!   kept, so memory and disk differ until the next successful save.
//! - Fetched records are never written to the snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::content::SourceKind;
use crate::error::RegistryError;
use crate::identity::ArtifactId;
use crate::record::{ArtifactMetadata, ArtifactRecord};
use crate::store::ContentStore;

/// File name of the registry snapshot under the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "cubirepo.dat";

const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format: u32,
    records: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    #[serde(flatten)]
    metadata: ArtifactMetadata,
    source: SourceKind,
}

/// Result of [`Registry::delete`].
#[derive(Debug)]
pub enum DeleteOutcome {
    /// The record was removed; its cached payload is gone as well.
    Deleted(Arc<ArtifactRecord>),
    /// No record had that identity. Nothing changed.
    Absent,
}

/// The process-wide artifact registry.
#[derive(Debug)]
pub struct Registry {
    records: RwLock<Vec<Arc<ArtifactRecord>>>,
    snapshot_path: PathBuf,
    cache: ContentStore,
    persist_lock: Mutex<()>,
}

impl Registry {
    /// An empty registry that will save to `snapshot_path`.
    pub fn new(snapshot_path: impl Into<PathBuf>, cache: ContentStore) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            snapshot_path: snapshot_path.into(),
            cache,
            persist_lock: Mutex::new(()),
        }
    }

    /// Load the registry from its snapshot.
    ///
    /// Never fails: a missing snapshot, an I/O error, or a decode error all
    /// yield an empty registry (the latter two are logged).
    pub fn restore(snapshot_path: impl Into<PathBuf>, cache: ContentStore) -> Self {
        let registry = Self::new(snapshot_path, cache);
        match load_snapshot(&registry.snapshot_path, &registry.cache) {
            Ok(Some(records)) => {
                tracing::info!(
                    path = %registry.snapshot_path.display(),
                    count = records.len(),
                    "restored registry snapshot"
                );
                *registry.records.write() = records;
            }
            Ok(None) => {
                tracing::info!(
                    path = %registry.snapshot_path.display(),
                    "no registry snapshot found, starting empty"
                );
            }
            Err(e) => {
                tracing::error!(
                    path = %registry.snapshot_path.display(),
                    error = %e,
                    "failed to restore registry snapshot, starting empty"
                );
            }
        }
        registry
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Payload cache that stored records are written to.
    pub fn cache(&self) -> &ContentStore {
        &self.cache
    }

    /// Case-insensitive exact match on all three identity components.
    ///
    /// The first matching record in registry order wins.
    pub fn find(&self, author: &str, name: &str, version: &str) -> Option<Arc<ArtifactRecord>> {
        self.records
            .read()
            .iter()
            .find(|r| r.id().matches(author, name, version))
            .cloned()
    }

    /// All records in the `(author, name)` namespace, in registry order.
    pub fn find_by_namespace(&self, author: &str, name: &str) -> Vec<Arc<ArtifactRecord>> {
        self.records
            .read()
            .iter()
            .filter(|r| r.id().in_namespace(author, name))
            .cloned()
            .collect()
    }

    /// Every record, in registry order.
    pub fn records(&self) -> Vec<Arc<ArtifactRecord>> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a record and save the snapshot.
    ///
    /// Uniqueness is not checked here; callers that need it check first.
    pub fn add(&self, record: ArtifactRecord) -> Arc<ArtifactRecord> {
        let record = Arc::new(record);
        let mut records = self.records.write();
        records.push(Arc::clone(&record));
        tracing::debug!(id = %record.id(), "added record");
        self.persist_logged(&records);
        record
    }

    /// Remove this exact record (by reference) and save the snapshot.
    ///
    /// Returns `false` without touching the snapshot when the record is not
    /// present.
    pub fn remove(&self, record: &Arc<ArtifactRecord>) -> bool {
        let mut records = self.records.write();
        let Some(pos) = records.iter().position(|r| Arc::ptr_eq(r, record)) else {
            return false;
        };
        records.remove(pos);
        tracing::debug!(id = %record.id(), "removed record");
        self.persist_logged(&records);
        true
    }

    /// Delete the record with this identity together with its cached payload.
    ///
    /// Deleting an identity that is not registered is a no-op. Records backed
    /// by fetched content are rejected with [`RegistryError::NotDeletable`].
    pub fn delete(
        &self,
        author: &str,
        name: &str,
        version: &str,
    ) -> Result<DeleteOutcome, RegistryError> {
        let removed = {
            let mut records = self.records.write();
            let Some(pos) = records
                .iter()
                .position(|r| r.id().matches(author, name, version))
            else {
                return Ok(DeleteOutcome::Absent);
            };
            if !records[pos].content().is_deletable() {
                return Err(RegistryError::NotDeletable(records[pos].id().clone()));
            }
            let removed = records.remove(pos);
            self.persist_logged(&records);
            removed
        };

        if let Err(e) = removed.content().delete() {
            tracing::warn!(id = %removed.id(), error = %e, "record deleted but cached payload remains");
        }
        tracing::info!(id = %removed.id(), "deleted record");
        Ok(DeleteOutcome::Deleted(removed))
    }

    /// Write the full collection to the snapshot file.
    pub fn persist(&self) -> Result<(), RegistryError> {
        let records = self.records.read();
        self.write_snapshot(&records)
    }

    fn persist_logged(&self, records: &[Arc<ArtifactRecord>]) {
        if let Err(e) = self.write_snapshot(records) {
            tracing::error!(
                path = %self.snapshot_path.display(),
                error = %e,
                "failed to save registry snapshot; in-memory state kept"
            );
        }
    }

    fn write_snapshot(&self, records: &[Arc<ArtifactRecord>]) -> Result<(), RegistryError> {
        let snapshot = Snapshot {
            format: SNAPSHOT_FORMAT,
            records: records
                .iter()
                .filter(|r| r.content().kind() == SourceKind::Stored)
                .map(|r| SnapshotEntry {
                    metadata: r.metadata(),
                    source: SourceKind::Stored,
                })
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let _guard = self.persist_lock.lock();
        let persistence = |source| RegistryError::Persistence {
            path: self.snapshot_path.clone(),
            source,
        };
        if let Some(parent) = self.snapshot_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(persistence)?;
            }
        }
        let tmp = temp_path(&self.snapshot_path);
        std::fs::write(&tmp, &bytes).map_err(persistence)?;
        std::fs::rename(&tmp, &self.snapshot_path).map_err(persistence)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| SNAPSHOT_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// `Ok(None)` when no snapshot exists yet.
fn load_snapshot(
    path: &Path,
    cache: &ContentStore,
) -> Result<Option<Vec<Arc<ArtifactRecord>>>, RegistryError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(RegistryError::Persistence {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    if snapshot.format != SNAPSHOT_FORMAT {
        return Err(RegistryError::Persistence {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unsupported snapshot format {}", snapshot.format),
            ),
        });
    }

    let mut records = Vec::with_capacity(snapshot.records.len());
    for entry in snapshot.records {
        let id: ArtifactId = entry.metadata.id();
        match entry.source {
            SourceKind::Stored => {
                let mut record = ArtifactRecord::stored(id, entry.metadata.file_type, cache);
                record.set_main_entry_point(entry.metadata.main_class);
                records.push(Arc::new(record));
            }
            SourceKind::Fetched => {
                tracing::warn!(%id, "skipping fetched record found in snapshot");
            }
        }
    }
    Ok(Some(records))
}
