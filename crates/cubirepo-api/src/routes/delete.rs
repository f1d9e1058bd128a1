//! # Artifact Deletion
//!
//! `GET /delete/?author=&name=&version=` removes a stored artifact, its
//! cached payload, and its snapshot entry. Unknown identities are a no-op.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use cubirepo_core::DeleteOutcome;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

pub const DELETED: &str = "Successfully deleted.";
pub const NOTHING_TO_DELETE: &str = "Nothing to delete.";

/// Identity of the artifact to delete.
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl DeleteParams {
    fn require(value: Option<String>, field: &str) -> Result<String, AppError> {
        value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("Missing query parameter '{field}'.")))
    }
}

/// Build the delete router.
pub fn router() -> Router<AppState> {
    Router::new().route("/delete/", get(delete))
}

/// GET /delete/: Delete a stored artifact.
async fn delete(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<&'static str, AppError> {
    let author = DeleteParams::require(params.author, "author")?;
    let name = DeleteParams::require(params.name, "name")?;
    let version = DeleteParams::require(params.version, "version")?;

    match state.registry.delete(&author, &name, &version)? {
        DeleteOutcome::Deleted(_) => Ok(DELETED),
        DeleteOutcome::Absent => {
            tracing::debug!(%author, %name, %version, "delete of unknown artifact ignored");
            Ok(NOTHING_TO_DELETE)
        }
    }
}
