//! Build server JSON shapes. Only the fields the feed reads are modeled;
//! everything else in the responses is ignored.

use serde::Deserialize;

/// `GET {project}/api/json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescription {
    /// Absent until the project has a stable build.
    #[serde(default)]
    pub last_stable_build: Option<BuildRef>,
}

/// Reference to one build of a project.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildRef {
    pub url: String,
}

/// `GET {build}/api/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildDescription {
    #[serde(default)]
    pub artifacts: Vec<BuildArtifact>,
}

/// One archived output of a build.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArtifact {
    pub file_name: String,
}

impl BuildDescription {
    /// First artifact whose lower-cased file name starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&BuildArtifact> {
        let prefix = prefix.to_lowercase();
        self.artifacts
            .iter()
            .find(|a| a.file_name.to_lowercase().starts_with(&prefix))
    }
}
