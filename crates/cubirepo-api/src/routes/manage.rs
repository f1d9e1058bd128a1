//! # Management Listing
//!
//! `GET /manage/` lists every registered artifact with its download path and
//! whether it can be deleted.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use cubirepo_core::{ArtifactMetadata, ArtifactRecord};
use serde::Serialize;

use crate::state::AppState;

/// One row of the management listing.
#[derive(Debug, Serialize)]
pub struct ManagedArtifact {
    #[serde(flatten)]
    pub metadata: ArtifactMetadata,
    /// Canonical download path of the payload.
    pub download: String,
    pub deletable: bool,
}

impl From<&ArtifactRecord> for ManagedArtifact {
    fn from(record: &ArtifactRecord) -> Self {
        Self {
            metadata: record.metadata(),
            download: record.id().download_path(record.file_extension()),
            deletable: record.content().is_deletable(),
        }
    }
}

/// Build the management router.
pub fn router() -> Router<AppState> {
    Router::new().route("/manage/", get(list))
}

/// GET /manage/: All artifacts in registry order.
async fn list(State(state): State<AppState>) -> Json<Vec<ManagedArtifact>> {
    let rows = state
        .registry
        .records()
        .iter()
        .map(|record| ManagedArtifact::from(record.as_ref()))
        .collect();
    Json(rows)
}
