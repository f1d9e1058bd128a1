//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from cubirepo-core to HTTP status codes. Every error
//! body is a short `text/plain` message; internal details are logged and
//! never returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cubirepo_core::{ContentError, RegistryError, ResolveError, UploadError};
use thiserror::Error;

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request path or identity did not resolve (404).
    #[error("{0}")]
    NotFound(String),

    /// Request could not be parsed or lacks required input (400).
    #[error("{0}")]
    BadRequest(String),

    /// Wrong login password (401).
    #[error("Invalid password.")]
    InvalidPassword,

    /// Mutating or administrative route reached without a session (403).
    #[error("Not logged in.")]
    NotLoggedIn,

    /// Operation not permitted on this resource (403).
    #[error("{0}")]
    Forbidden(String),

    /// Identity components failed validation (422).
    #[error("{0}")]
    Validation(String),

    /// Conflict with an existing record (409).
    #[error("{0}")]
    Conflict(String),

    /// Artifact bytes could not be produced, e.g. the build feed is down (503).
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidPassword => (StatusCode::UNAUTHORIZED, "INVALID_PASSWORD"),
            Self::NotLoggedIn => (StatusCode::FORBIDDEN, "NOT_LOGGED_IN"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "CONTENT_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// A failure to produce an artifact's payload for download.
    ///
    /// Every cause is unavailable content, including a missing or unreadable
    /// cache file. Cache paths are logged, never returned.
    pub fn content_unavailable(err: ContentError) -> Self {
        match err {
            ContentError::Unavailable(_) => Self::ServiceUnavailable(err.to_string()),
            ContentError::Io { .. } => {
                tracing::error!(error = %err, "stored payload could not be read");
                Self::ServiceUnavailable("content unavailable: stored payload could not be read".into())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred.".to_string()
            }
            other => {
                tracing::debug!(status = status.as_u16(), code, error = %other, "request failed");
                other.to_string()
            }
        };

        (status, message).into_response()
    }
}

/// All resolution failures are "not found" to the client; the message tells
/// them apart.
impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        Self::NotFound(err.to_string())
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Unavailable(_) => Self::ServiceUnavailable(err.to_string()),
            ContentError::Io { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingPayload => Self::BadRequest(err.to_string()),
            UploadError::InvalidIdentity { .. } => Self::Validation(err.to_string()),
            UploadError::DuplicateIdentity(_) | UploadError::CacheConflict { .. } => {
                Self::Conflict(err.to_string())
            }
            UploadError::Content(inner) => inner.into(),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotDeletable(_) => Self::Forbidden(err.to_string()),
            RegistryError::Persistence { .. } | RegistryError::Snapshot(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
