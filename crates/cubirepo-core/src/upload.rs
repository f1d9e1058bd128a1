//! # Upload Handling
//!
//! Validates an inbound submission, writes its payload into the cache, and
//! commits a new stored record to the registry.

use std::sync::Arc;

use crate::error::UploadError;
use crate::identity::{eq_ignore_case, ArtifactId};
use crate::record::ArtifactRecord;
use crate::registry::Registry;

/// The binary part of a submission.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Filename as sent by the client; only its extension is used.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// An upload request, already extracted from its transport.
#[derive(Debug, Clone)]
pub struct Submission {
    pub name: String,
    pub author: String,
    pub version: String,
    pub main_entry_point: Option<String>,
    pub file: Option<FilePart>,
}

/// Commits submissions to a [`Registry`].
#[derive(Debug, Clone, Copy)]
pub struct UploadHandler<'a> {
    registry: &'a Registry,
}

impl<'a> UploadHandler<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Validate and store a submission, returning the committed record.
    ///
    /// Rejects a submission whose identity triple is already registered.
    /// The check and the append are not atomic; concurrent uploads of the
    /// same identity are outside the single-writer model.
    pub fn handle(&self, submission: Submission) -> Result<Arc<ArtifactRecord>, UploadError> {
        let file = match submission.file {
            Some(file) if !file.bytes.is_empty() => file,
            _ => return Err(UploadError::MissingPayload),
        };

        let name = identity_component("name", submission.name)?;
        let author = identity_component("author", submission.author)?;
        let version = identity_component("version", submission.version)?;
        let id = ArtifactId::new(author, name, version);

        if self
            .registry
            .find(id.author(), id.name(), id.version())
            .is_some()
        {
            return Err(UploadError::DuplicateIdentity(id));
        }

        let extension = identity_component("file", extension_from_filename(&file.filename))?;
        let mut record = ArtifactRecord::stored(id, extension, self.registry.cache());
        if let Some(existing) = self.cache_owner(&record) {
            return Err(UploadError::CacheConflict {
                id: record.id().clone(),
                existing: existing.id().clone(),
            });
        }
        record.write_content(&file.bytes)?;
        if let Some(entry) = submission.main_entry_point.filter(|e| !e.is_empty()) {
            record.set_main_entry_point(Some(entry));
        }

        tracing::info!(
            id = %record.id(),
            file_type = record.file_extension(),
            bytes = file.bytes.len(),
            "uploaded new artifact"
        );
        Ok(self.registry.add(record))
    }
}

impl UploadHandler<'_> {
    /// Registered stored record whose cache file `record` would overwrite.
    ///
    /// Underscores in identity components make distinct triples collide in
    /// the `{name}_{author}_{version}.{ext}` layout.
    fn cache_owner(&self, record: &ArtifactRecord) -> Option<Arc<ArtifactRecord>> {
        let path = record.content().stored_path()?.to_string_lossy();
        self.registry.records().into_iter().find(|existing| {
            existing
                .content()
                .stored_path()
                .is_some_and(|p| eq_ignore_case(&p.to_string_lossy(), &path))
        })
    }
}

/// Extension of an uploaded filename: everything after the last `.`, with a
/// single trailing quote removed. A filename without a `.` is used whole.
pub fn extension_from_filename(filename: &str) -> String {
    let ext = filename
        .rsplit_once('.')
        .map_or(filename, |(_, ext)| ext);
    ext.strip_suffix('"')
        .or_else(|| ext.strip_suffix('\''))
        .unwrap_or(ext)
        .to_string()
}

/// Identity components and the extension become part of the cache file name.
fn identity_component(field: &'static str, value: String) -> Result<String, UploadError> {
    let value = value.trim().to_string();
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if value.contains("..") {
        Some("must not contain '..'")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(UploadError::InvalidIdentity {
            field,
            reason: reason.to_string(),
        }),
        None => Ok(value),
    }
}
