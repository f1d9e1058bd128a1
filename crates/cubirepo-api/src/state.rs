//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! AppState holds the process-wide [`Registry`], the set of live login
//! sessions, and the immutable runtime configuration. Everything is behind
//! `Arc`, so cloning the state per request is cheap.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cubirepo_core::{ContentStore, Registry, CACHE_DIR_NAME, SNAPSHOT_FILE_NAME};
use parking_lot::RwLock;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3645;

/// Password used when none is configured. Startup warns when it is in effect.
pub const DEFAULT_PASSWORD: &str = "12345";

/// Default upload body limit in mebibytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 64;

// -- Configuration ------------------------------------------------------------

/// Runtime configuration.
///
/// Custom `Debug` redacts the password to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub password: Zeroizing<String>,
    /// Directory holding the snapshot file and the payload cache.
    pub data_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE_NAME)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(CACHE_DIR_NAME)
    }

    pub fn uses_default_password(&self) -> bool {
        self.password.as_str() == DEFAULT_PASSWORD
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            password: Zeroizing::new(DEFAULT_PASSWORD.to_string()),
            data_dir: PathBuf::from("."),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("password", &"[REDACTED]")
            .field("data_dir", &self.data_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

// -- Sessions -----------------------------------------------------------------

/// In-memory set of issued session ids. Sessions never expire.
///
/// The lock is `parking_lot` and never held across `.await` points.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    ids: Arc<RwLock<HashSet<Uuid>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue and remember a fresh session id.
    pub fn issue(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.ids.write().insert(id);
        id
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.read().is_empty()
    }
}

// -- AppState -----------------------------------------------------------------

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub sessions: SessionStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build state around an already-restored registry.
    pub fn new(config: AppConfig, registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            sessions: SessionStore::new(),
            config: Arc::new(config),
        }
    }

    /// Empty registry rooted at `data_dir`, without restoring a snapshot.
    pub fn empty(config: AppConfig) -> Self {
        let registry = registry_in(&config.data_dir, false);
        Self::new(config, registry)
    }
}

/// Registry whose snapshot and cache live under `data_dir`.
pub(crate) fn registry_in(data_dir: &Path, restore: bool) -> Registry {
    let snapshot = data_dir.join(SNAPSHOT_FILE_NAME);
    let cache = ContentStore::new(data_dir.join(CACHE_DIR_NAME));
    if restore {
        Registry::restore(snapshot, cache)
    } else {
        Registry::new(snapshot, cache)
    }
}
