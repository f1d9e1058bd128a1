//! # Login
//!
//! `GET /login/?password=…` exchanges the configured password for a session
//! cookie. The password is compared in constant time.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth;
use crate::error::AppError;
use crate::state::AppState;

pub const LOGGED_IN: &str = "Logged in.";
pub const LOGIN_PROMPT: &str = "Please log in: /login/?password=<password>";

/// Login query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginParams {
    #[serde(default)]
    pub password: Option<String>,
}

/// Build the login router.
pub fn router() -> Router<AppState> {
    Router::new().route("/login/", get(login))
}

/// GET /login/: Start a session.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<LoginParams>,
) -> Result<(CookieJar, &'static str), AppError> {
    if auth::has_session(&state, &jar) {
        return Ok((jar, LOGGED_IN));
    }

    let Some(password) = params.password else {
        return Ok((jar, LOGIN_PROMPT));
    };

    if !auth::password_matches(&password, &state.config.password) {
        tracing::warn!("login attempt with wrong password");
        return Err(AppError::InvalidPassword);
    }

    let jar = auth::start_session(&state, jar);
    tracing::info!(sessions = state.sessions.len(), "session started");
    Ok((jar, LOGGED_IN))
}
