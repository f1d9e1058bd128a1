//! # cubirepo-api: Axum HTTP Service for the Artifact Registry
//!
//! ## API Surface
//!
//! | Route                                   | Module                  | Session |
//! |-----------------------------------------|-------------------------|---------|
//! | `GET /{author}/{name}/{name}_{v}.{ext}` | [`routes::artifacts`]   | no      |
//! | `GET /login/`                           | [`routes::session`]     | no      |
//! | `POST /upload/`                         | [`routes::upload`]      | yes     |
//! | `GET /delete/`                          | [`routes::delete`]      | yes     |
//! | `GET /manage/`                          | [`routes::manage`]      | yes     |
//! | `GET /health/*`                         | this module             | no      |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → BodyLimit → SessionGate (admin routes only) → Handler
//! ```
//!
//! Unmatched routes answer 404 `File not found.`

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    // Session-gated administrative routes.
    let admin = Router::new()
        .merge(routes::upload::router())
        .merge(routes::delete::router())
        .merge(routes::manage::router())
        .route_layer(from_fn_with_state(state.clone(), auth::require_session));

    // Public routes.
    let public = Router::new()
        .merge(routes::session::router())
        .merge(routes::artifacts::router())
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(admin)
        .merge(public)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Liveness check: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: the registry is restored before the listener binds.
async fn readiness() -> &'static str {
    "ready"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "File not found.")
}
