//! # cubirepo-core: Artifact Registry Core
//!
//! Identity model, content sources, and lookup rules for the cubirepo
//! artifact registry. Artifacts are published under an
//! `(author, name, version)` triple and fetched through a predictable path
//! of the form `/{author}/{name}/{name}_{version}.{ext}`.
//!
//! ## Key Design Principles
//!
//! 1. **Case-insensitive identity.** [`ArtifactId`] compares all three
//!    components case-insensitively. Nothing else in the crate compares
//!    identity strings directly.
//!
//! 2. **One lookup contract, several content strategies.** Every record owns
//!    a [`ContentSource`]: bytes stored in the local cache, or bytes fetched
//!    live from a build server through the [`BuildFeed`] capability. Fetched
//!    sources are read-only; their mutators are explicit no-ops.
//!
//! 3. **The registry is a value, not a global.** [`Registry`] is created once
//!    at startup from its snapshot and threaded into the resolver and upload
//!    handler explicitly.
//!
//! 4. **Disambiguated lookup outcomes.** [`PathResolver`] distinguishes an
//!    unknown namespace from an unknown version and from a wrong extension.
//!
//! ## Crate Policy
//!
//! - No HTTP server dependencies; the API crate maps errors to responses.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Registry locks are never held across `.await` points.

pub mod content;
pub mod error;
pub mod identity;
pub mod record;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod upload;

pub use content::{BuildFeed, ContentSource, FetchedContent, SourceKind, StoredContent};
pub use error::{ContentError, RegistryError, ResolveError, UploadError};
pub use identity::{eq_ignore_case, ArtifactId};
pub use record::{ArtifactMetadata, ArtifactRecord};
pub use registry::{DeleteOutcome, Registry, SNAPSHOT_FILE_NAME};
pub use resolve::{ArtifactQuery, PathResolver, Representation, Resolved};
pub use store::{ContentStore, CACHE_DIR_NAME};
pub use upload::{FilePart, Submission, UploadHandler};
