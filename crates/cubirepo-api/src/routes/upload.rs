//! # Artifact Upload
//!
//! `POST /upload/?name=&author=&version=[&mainClass=]` with a multipart body
//! whose `file` part carries the payload. Identity fields may also be sent as
//! multipart text parts; query parameters take precedence.

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Query, State};
use axum::routing::post;
use axum::Router;
use cubirepo_core::{FilePart, Submission, UploadHandler};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

pub const UPLOADED: &str = "Upload completed successfully.";

/// Identity supplied in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "mainClass")]
    pub main_class: Option<String>,
}

/// Build the upload router.
pub fn router() -> Router<AppState> {
    Router::new().route("/upload/", post(upload))
}

/// POST /upload/: Register a new stored artifact.
async fn upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, AppError> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let submission = read_submission(params, multipart).await?;

    let registry = Arc::clone(&state.registry);
    let record = tokio::task::spawn_blocking(move || UploadHandler::new(&registry).handle(submission))
        .await
        .map_err(|e| AppError::Internal(format!("upload task failed: {e}")))??;

    tracing::debug!(id = %record.id(), "upload committed");
    Ok(UPLOADED)
}

/// Collect the `file` part and any identity text parts, then overlay the
/// query parameters.
async fn read_submission(
    params: UploadParams,
    mut multipart: Multipart,
) -> Result<Submission, AppError> {
    let mut form = UploadParams::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                file = Some(FilePart {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "name" => form.name = Some(field.text().await.map_err(bad_multipart)?),
            "author" => form.author = Some(field.text().await.map_err(bad_multipart)?),
            "version" => form.version = Some(field.text().await.map_err(bad_multipart)?),
            "mainClass" => form.main_class = Some(field.text().await.map_err(bad_multipart)?),
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    Ok(Submission {
        name: params.name.or(form.name).unwrap_or_default(),
        author: params.author.or(form.author).unwrap_or_default(),
        version: params.version.or(form.version).unwrap_or_default(),
        main_entry_point: params.main_class.or(form.main_class),
        file,
    })
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}
