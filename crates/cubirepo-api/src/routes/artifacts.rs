//! # Artifact Downloads
//!
//! `GET /{author}/{name}/{name}_{version}.{ext}` serves the stored payload as
//! `application/octet-stream`; `.json` serves the metadata view instead.
//! Resolution failures are 404 with a message naming the reason.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cubirepo_core::{PathResolver, Representation};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Path parameters of a download.
#[derive(Debug, Deserialize)]
pub struct ArtifactPath {
    pub author: String,
    pub name: String,
    /// Everything after `/{author}/{name}/`, percent-decoded. Only its last
    /// segment names the artifact.
    pub file: String,
}

/// Build the download router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{author}/{name}/{*file}", get(download))
}

/// GET /{author}/{name}/{*file}: Artifact payload or metadata.
async fn download(
    State(state): State<AppState>,
    Path(params): Path<ArtifactPath>,
) -> Result<Response, AppError> {
    let resolved =
        PathResolver::new(&state.registry).resolve(&params.file, &params.author, &params.name)?;

    match resolved.representation {
        Representation::Metadata => Ok(Json(resolved.record.metadata()).into_response()),
        Representation::Binary => {
            let bytes = resolved
                .record
                .read_content()
                .await
                .map_err(AppError::content_unavailable)?;
            tracing::debug!(
                id = %resolved.record.id(),
                bytes = bytes.len(),
                "serving artifact payload"
            );
            Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response())
        }
    }
}
