//! # Session Gate
//!
//! Password login and the middleware guarding mutating and administrative
//! routes.
//!
//! ```text
//! GET /login/?password=…  →  Set-Cookie: cubirepo_session=<uuid>; HttpOnly; Path=/
//! ```
//!
//! The cookie value must name a session issued by this process; anything
//! else (absent cookie, unparsable id, unknown id) is treated as logged out.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "cubirepo_session";

/// Constant-time comparison of a presented password with the configured one.
pub fn password_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Whether the request carries a session issued by this process.
pub fn has_session(state: &AppState, jar: &CookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .is_some_and(|id| state.sessions.contains(&id))
}

/// Issue a new session and add its cookie to the jar.
pub fn start_session(state: &AppState, jar: CookieJar) -> CookieJar {
    let id = state.sessions.issue();
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .http_only(true)
        .path("/");
    jar.add(cookie)
}

/// Reject the request with 403 unless it carries a valid session.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !has_session(&state, &jar) {
        tracing::debug!(path = %request.uri().path(), "rejected request without session");
        return Err(AppError::NotLoggedIn);
    }
    Ok(next.run(request).await)
}
