//! # Artifact Identity
//!
//! The identity triple `(author, name, version)` designates one artifact.
//! The `(author, name)` pair is its namespace. All comparisons are
//! case-insensitive; the original spelling is kept for display and for the
//! cache file name.

use serde::{Deserialize, Serialize};

/// Case-insensitive string equality without allocating.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Identity of one published artifact.
///
/// Equality ignores case on every component, so `Bob/Tool@1.0` and
/// `bob/tool@1.0` are the same artifact. Not `Hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactId {
    author: String,
    name: String,
    version: String,
}

impl ArtifactId {
    /// Build an identity from its three components, as spelled by the publisher.
    pub fn new(
        author: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether this artifact lives in the `(author, name)` namespace.
    pub fn in_namespace(&self, author: &str, name: &str) -> bool {
        eq_ignore_case(&self.author, author) && eq_ignore_case(&self.name, name)
    }

    /// Whether this artifact is exactly `(author, name, version)`.
    pub fn matches(&self, author: &str, name: &str, version: &str) -> bool {
        self.in_namespace(author, name) && eq_ignore_case(&self.version, version)
    }

    /// File name of the cached payload: `{name}_{author}_{version}.{extension}`.
    pub fn cache_file_name(&self, extension: &str) -> String {
        format!(
            "{}_{}_{}.{}",
            self.name, self.author, self.version, extension
        )
    }

    /// Canonical download path: `/{author}/{name}/{name}_{version}.{extension}`.
    pub fn download_path(&self, extension: &str) -> String {
        format!(
            "/{}/{}/{}_{}.{}",
            self.author, self.name, self.name, self.version, extension
        )
    }
}

impl PartialEq for ArtifactId {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.author, &other.name, &other.version)
    }
}

impl Eq for ArtifactId {}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.author, self.name, self.version)
    }
}
