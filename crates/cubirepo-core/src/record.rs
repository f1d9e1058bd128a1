//! # Artifact Records
//!
//! An [`ArtifactRecord`] is identity plus metadata plus the content source
//! that owns its payload. Records are shared as `Arc<ArtifactRecord>` once
//! they are in the registry and are replaced wholesale, never patched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content::{BuildFeed, ContentSource, FetchedContent, StoredContent};
use crate::error::ContentError;
use crate::identity::ArtifactId;
use crate::store::ContentStore;

/// One published artifact.
#[derive(Debug, Clone)]
pub struct ArtifactRecord {
    id: ArtifactId,
    file_extension: String,
    main_entry_point: Option<String>,
    content: ContentSource,
}

impl ArtifactRecord {
    /// A record whose payload lives in the local cache.
    ///
    /// The cache path is derived from the identity and extension; no bytes
    /// are written until [`ArtifactRecord::write_content`] is called.
    pub fn stored(id: ArtifactId, file_extension: impl Into<String>, cache: &ContentStore) -> Self {
        let file_extension = file_extension.into();
        let path = cache.artifact_path(&id, &file_extension);
        Self {
            id,
            file_extension,
            main_entry_point: None,
            content: ContentSource::Stored(StoredContent::new(cache.clone(), path)),
        }
    }

    /// A read-only record whose payload is fetched from a build server.
    pub fn fetched(
        id: ArtifactId,
        file_extension: impl Into<String>,
        main_entry_point: Option<String>,
        feed: Arc<dyn BuildFeed>,
    ) -> Self {
        Self {
            id,
            file_extension: file_extension.into(),
            main_entry_point,
            content: ContentSource::Fetched(FetchedContent::new(feed)),
        }
    }

    pub fn id(&self) -> &ArtifactId {
        &self.id
    }

    /// Extension the binary representation is published under (e.g. `jar`).
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    pub fn main_entry_point(&self) -> Option<&str> {
        self.main_entry_point.as_deref()
    }

    pub fn content(&self) -> &ContentSource {
        &self.content
    }

    /// Set the entry point. Ignored for fetched records, whose metadata is fixed.
    pub fn set_main_entry_point(&mut self, main_entry_point: Option<String>) {
        if self.content.is_deletable() {
            self.main_entry_point = main_entry_point;
        } else {
            tracing::debug!(id = %self.id, "ignoring entry point change on read-only record");
        }
    }

    /// Write the payload through the content source.
    pub fn write_content(&self, bytes: &[u8]) -> Result<(), ContentError> {
        self.content.write(bytes)
    }

    /// Read the payload through the content source.
    pub async fn read_content(&self) -> Result<Vec<u8>, ContentError> {
        self.content.read().await
    }

    /// JSON-facing metadata view, excluding the payload.
    pub fn metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            name: self.id.name().to_string(),
            author: self.id.author().to_string(),
            version: self.id.version().to_string(),
            file_type: self.file_extension.clone(),
            main_class: self.main_entry_point.clone(),
        }
    }
}

/// Metadata representation of a record, served for `*.json` requests and
/// stored in the registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub author: String,
    pub version: String,
    #[serde(rename = "type")]
    pub file_type: String,
    #[serde(rename = "mainClass", default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
}

impl ArtifactMetadata {
    pub fn id(&self) -> ArtifactId {
        ArtifactId::new(&self.author, &self.name, &self.version)
    }
}
