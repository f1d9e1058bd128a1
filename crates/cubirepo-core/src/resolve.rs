//! # Path Resolution
//!
//! Turns an inbound request path of the shape
//! `/{author}/{name}/{name}_{version}.{ext}` into a registry record and the
//! representation the caller asked for.
//!
//! ## Rules
//!
//! 1. The file name is the final path segment; its extension is everything
//!    after the last `.`. No `.` means the request is malformed.
//! 2. The file name without extension must start with `{name}_`, which keeps
//!    download names self-describing. The rest is the version.
//! 3. Lookup is case-insensitive. An unknown namespace and an unknown
//!    version within a known namespace are reported differently.
//! 4. The extension `json` always selects the metadata view. Any other
//!    extension must equal the record's own extension.

use std::sync::Arc;

use crate::error::ResolveError;
use crate::identity::eq_ignore_case;
use crate::record::ArtifactRecord;
use crate::registry::Registry;

/// Extension that selects the metadata representation.
const METADATA_EXTENSION: &str = "json";

/// Which view of the artifact the request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Identity, extension and entry point as JSON; never the payload.
    Metadata,
    /// The raw payload bytes.
    Binary,
}

/// A successfully resolved request.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub record: Arc<ArtifactRecord>,
    pub representation: Representation,
}

/// Identity query parsed out of a request path, all lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactQuery {
    pub author: String,
    pub name: String,
    pub version: String,
    pub extension: String,
}

impl ArtifactQuery {
    /// Parse the final segment of `path` against the `author` and `name`
    /// path parameters.
    pub fn parse(path: &str, author: &str, name: &str) -> Result<Self, ResolveError> {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
        let Some((stem, extension)) = file_name.rsplit_once('.') else {
            return Err(ResolveError::MalformedRequest(format!(
                "'{file_name}' has no extension"
            )));
        };

        let author = author.to_lowercase();
        let name = name.to_lowercase();
        let prefix = format!("{name}_");
        let Some(version) = stem.strip_prefix(&prefix) else {
            return Err(ResolveError::MalformedRequest(format!(
                "'{file_name}' does not start with '{prefix}'"
            )));
        };

        Ok(Self {
            version: version.to_string(),
            extension: extension.to_string(),
            author,
            name,
        })
    }
}

/// Resolves request paths against a [`Registry`].
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    registry: &'a Registry,
}

impl<'a> PathResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolve `path` with its `author` and `name` parameters to a record and
    /// a representation.
    pub fn resolve(&self, path: &str, author: &str, name: &str) -> Result<Resolved, ResolveError> {
        let query = ArtifactQuery::parse(path, author, name)?;
        self.resolve_query(&query)
    }

    pub fn resolve_query(&self, query: &ArtifactQuery) -> Result<Resolved, ResolveError> {
        let namespace = self.registry.find_by_namespace(&query.author, &query.name);
        if namespace.is_empty() {
            return Err(ResolveError::NotFoundNoVariants {
                author: query.author.clone(),
                name: query.name.clone(),
            });
        }

        let Some(record) = namespace
            .into_iter()
            .find(|r| eq_ignore_case(r.id().version(), &query.version))
        else {
            return Err(ResolveError::NotFoundVersionMismatch {
                author: query.author.clone(),
                name: query.name.clone(),
                version: query.version.clone(),
            });
        };

        let representation = if eq_ignore_case(&query.extension, METADATA_EXTENSION) {
            Representation::Metadata
        } else if eq_ignore_case(&query.extension, record.file_extension()) {
            Representation::Binary
        } else {
            return Err(ResolveError::ExtensionMismatch {
                id: record.id().clone(),
                requested: query.extension.clone(),
            });
        };

        Ok(Resolved {
            record,
            representation,
        })
    }
}
