//! # Error Types
//!
//! Structured error hierarchy for the registry core. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Lookup failures are resolved into one [`ResolveError`] kind each, so
//!   the HTTP layer can map them without re-inspecting the request.
//! - Content failures carry the path or reason that produced them.
//! - Persistence failures never abort the process; callers log them.

use std::path::PathBuf;

use thiserror::Error;

use crate::identity::ArtifactId;

/// Why a request path could not be resolved to an artifact representation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The path does not parse into an identity and an extension.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// No record exists under the requested `(author, name)` namespace.
    #[error("resource {author}/{name} not found, and no variants detected")]
    NotFoundNoVariants {
        /// Requested author.
        author: String,
        /// Requested name.
        name: String,
    },

    /// The namespace exists but none of its records has the requested version.
    #[error("version {version} of {author}/{name} not found, but the resource exists in other variants")]
    NotFoundVersionMismatch {
        /// Requested author.
        author: String,
        /// Requested name.
        name: String,
        /// Requested version.
        version: String,
    },

    /// The record exists but is not published under the requested extension.
    #[error("{id} is not available as .{requested}")]
    ExtensionMismatch {
        /// Identity of the matched record.
        id: ArtifactId,
        /// The extension the caller asked for.
        requested: String,
    },
}

/// Failure to produce or change the bytes behind a content source.
#[derive(Error, Debug)]
pub enum ContentError {
    /// The source could not produce bytes (remote fetch failed, timed out,
    /// or the build server had nothing matching).
    #[error("content unavailable: {0}")]
    Unavailable(String),

    /// Local cache I/O failed.
    #[error("content I/O failed for {path}: {source}")]
    Io {
        /// Cache file involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Registry-level failures.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Snapshot file could not be read or written.
    #[error("snapshot I/O failed for {path}: {source}")]
    Persistence {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Snapshot contents could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The record is backed by a read-only source and cannot be removed.
    #[error("{0} cannot be deleted")]
    NotDeletable(ArtifactId),
}

/// Rejected upload submissions.
#[derive(Error, Debug)]
pub enum UploadError {
    /// No file part was submitted, or it was empty.
    #[error("failed to upload a file with your request (as part \"file\")")]
    MissingPayload,

    /// An identity component is empty or cannot name a cache file.
    #[error("invalid {field}: {reason}")]
    InvalidIdentity {
        /// Offending submission field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A record with the same identity triple already exists.
    #[error("{0} already exists")]
    DuplicateIdentity(ArtifactId),

    /// A different record is already stored under the same cache file name,
    /// e.g. `a` by `b_c` and `a_b` by `c`.
    #[error("{id} would overwrite the stored payload of {existing}")]
    CacheConflict { id: ArtifactId, existing: ArtifactId },

    /// Writing the payload to the cache failed.
    #[error(transparent)]
    Content(#[from] ContentError),
}
