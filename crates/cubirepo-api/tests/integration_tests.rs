//! # Integration Tests for cubirepo-api
//!
//! Drives the full router with `oneshot`: health checks, login and the
//! session gate, multipart upload, binary and metadata downloads, the
//! not-found diagnostics, deletion, the management listing, and the live
//! build-feed record.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use cubirepo_api::state::{AppConfig, AppState};
use cubirepo_core::{BuildFeed, ContentError};

const BOUNDARY: &str = "cubirepo-test-boundary";

/// Helper: app rooted in a fresh temp dir, plus the dir guard.
fn test_app() -> (axum::Router, AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let state = cubirepo_api::bootstrap::bootstrap(config, None).unwrap();
    (cubirepo_api::app(state.clone()), state, dir)
}

/// Helper: read response body as bytes.
async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Helper: read response body as string.
async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

async fn get(app: &axum::Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Helper: log in with the default password and return the `Cookie` value.
async fn login(app: &axum::Router) -> String {
    let response = get(app, "/login/?password=12345", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert_eq!(body_string(response).await, "Logged in.");
    set_cookie.split(';').next().unwrap().to_string()
}

fn multipart_body(filename: &str, bytes: &[u8], text_fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(app: &axum::Router, cookie: Option<&str>, query: &str, body: Vec<u8>) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/upload/?{query}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

#[derive(Debug)]
struct StaticFeed(Vec<u8>);

#[async_trait]
impl BuildFeed for StaticFeed {
    async fn fetch_latest(&self) -> Result<Vec<u8>, ContentError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
struct DownFeed;

#[async_trait]
impl BuildFeed for DownFeed {
    async fn fetch_latest(&self) -> Result<Vec<u8>, ContentError> {
        Err(ContentError::Unavailable("build server unreachable".into()))
    }
}

// -- Health Checks ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_check() {
    let (app, _, _dir) = test_app();
    let response = get(&app, "/health/liveness", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_check() {
    let (app, _, _dir) = test_app();
    let response = get(&app, "/health/readiness", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_unknown_route_is_file_not_found() {
    let (app, _, _dir) = test_app();
    let response = get(&app, "/nothing", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "File not found.");
}

// -- Login & Session Gate -----------------------------------------------------

#[tokio::test]
async fn test_login_without_password_prompts() {
    let (app, _, _dir) = test_app();
    let response = get(&app, "/login/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_string(response).await.contains("password"));
}

#[tokio::test]
async fn test_login_with_wrong_password_is_401() {
    let (app, state, _dir) = test_app();
    let response = get(&app, "/login/?password=nope", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "Invalid password.");
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_login_again_with_session_keeps_it() {
    let (app, state, _dir) = test_app();
    let cookie = login(&app).await;
    let response = get(&app, "/login/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Logged in.");
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let (app, _, _dir) = test_app();

    let response = get(&app, "/manage/", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "Not logged in.");

    let response = get(&app, "/delete/?author=bar&name=foo&version=1.0", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = multipart_body("foo.jar", &[1, 2], &[]);
    let response = upload(&app, None, "name=foo&author=bar&version=1.0", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(&app, "/manage/", Some("cubirepo_session=not-a-session")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// -- Upload / Download / Delete ----------------------------------------------

#[tokio::test]
async fn test_upload_download_delete_lifecycle() {
    let (app, state, dir) = test_app();
    let cookie = login(&app).await;

    let body = multipart_body("foo.jar", &[0x01, 0x02], &[]);
    let response = upload(&app, Some(&cookie), "name=foo&author=bar&version=1.0", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Upload completed successfully.");
    assert_eq!(state.registry.len(), 1);
    assert!(dir.path().join("cache").join("foo_bar_1.0.jar").is_file());

    let response = get(&app, "/bar/foo/foo_1.0.jar", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response).await, vec![0x01, 0x02]);

    let response = get(&app, "/bar/foo/foo_1.0.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"name": "foo", "author": "bar", "version": "1.0", "type": "jar"})
    );

    let response = get(&app, "/bar/foo/foo_2.0.jar", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("other variants"));

    let response = get(&app, "/delete/?author=bar&name=foo&version=1.0", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Successfully deleted.");
    assert!(!dir.path().join("cache").join("foo_bar_1.0.jar").exists());

    let response = get(&app, "/bar/foo/foo_1.0.jar", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("no variants detected"));
}

#[tokio::test]
async fn test_download_is_case_insensitive() {
    let (app, _, _dir) = test_app();
    let cookie = login(&app).await;
    let body = multipart_body("Tool.zip", b"zip bytes", &[]);
    let response = upload(&app, Some(&cookie), "name=Tool&author=Bob&version=1.0", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/bob/tool/tool_1.0.zip", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"zip bytes".to_vec());

    let response = get(&app, "/BOB/TOOL/TOOL_1.0.ZIP", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_extension_and_malformed_name_are_404() {
    let (app, _, _dir) = test_app();
    let cookie = login(&app).await;
    let body = multipart_body("foo.jar", &[7], &[]);
    upload(&app, Some(&cookie), "name=foo&author=bar&version=1.0", body).await;

    let response = get(&app, "/bar/foo/foo_1.0.zip", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, "/bar/foo/other_1.0.jar", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, "/bar/foo/foo_1", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_identity_from_multipart_fields() {
    let (app, state, _dir) = test_app();
    let cookie = login(&app).await;
    let body = multipart_body(
        "plugin.jar",
        &[9, 9],
        &[
            ("name", "plugin"),
            ("author", "alice"),
            ("version", "0.3"),
            ("mainClass", "alice.plugin.Main"),
        ],
    );
    let response = upload(&app, Some(&cookie), "", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let record = state.registry.find("alice", "plugin", "0.3").unwrap();
    assert_eq!(record.main_entry_point(), Some("alice.plugin.Main"));

    let response = get(&app, "/alice/plugin/plugin_0.3.json", None).await;
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["mainClass"], "alice.plugin.Main");
}

#[tokio::test]
async fn test_upload_rejections() {
    let (app, state, _dir) = test_app();
    let cookie = login(&app).await;

    // Empty payload.
    let body = multipart_body("foo.jar", &[], &[]);
    let response = upload(&app, Some(&cookie), "name=foo&author=bar&version=1.0", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Path traversal in an identity component.
    let body = multipart_body("foo.jar", &[1], &[]);
    let response = upload(&app, Some(&cookie), "name=foo&author=..&version=1.0", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Duplicate identity, differing only in case.
    let body = multipart_body("foo.jar", &[1], &[]);
    let response = upload(&app, Some(&cookie), "name=foo&author=bar&version=1.0", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = multipart_body("foo.jar", &[2], &[]);
    let response = upload(&app, Some(&cookie), "name=FOO&author=bar&version=1.0", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(state.registry.len(), 1);

    // Not a multipart request at all.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload/?name=foo&author=bar&version=2.0")
                .header(header::COOKIE, &cookie)
                .body(Body::from("raw bytes"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_sharing_a_cache_file_is_409() {
    let (app, state, _dir) = test_app();
    let cookie = login(&app).await;

    let body = multipart_body("a.jar", &[1, 1], &[]);
    let response = upload(&app, Some(&cookie), "name=a&author=b_c&version=1", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = multipart_body("a_b.jar", &[2, 2], &[]);
    let response = upload(&app, Some(&cookie), "name=a_b&author=c&version=1", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(state.registry.len(), 1);

    let response = get(&app, "/b_c/a/a_1.jar", None).await;
    assert_eq!(body_bytes(response).await, vec![1, 1]);
}

#[tokio::test]
async fn test_upload_without_usable_extension_is_422() {
    let (app, state, _dir) = test_app();
    let cookie = login(&app).await;
    let body = multipart_body("foo.", &[1], &[]);
    let response = upload(&app, Some(&cookie), "name=foo&author=bar&version=1.0", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(state.registry.is_empty());
}

#[tokio::test]
async fn test_missing_cache_file_is_503() {
    let (app, _, dir) = test_app();
    let cookie = login(&app).await;
    let body = multipart_body("foo.jar", &[1], &[]);
    upload(&app, Some(&cookie), "name=foo&author=bar&version=1.0", body).await;
    std::fs::remove_file(dir.path().join("cache").join("foo_bar_1.0.jar")).unwrap();

    let response = get(&app, "/bar/foo/foo_1.0.jar", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_string(response).await;
    assert!(!body.contains(&dir.path().display().to_string()));
}

#[tokio::test]
async fn test_delete_unknown_is_noop_and_missing_params_400() {
    let (app, _, _dir) = test_app();
    let cookie = login(&app).await;

    let response = get(&app, "/delete/?author=bar&name=foo&version=9.9", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Nothing to delete.");

    let response = get(&app, "/delete/?author=bar&name=foo", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_uploads_survive_restart() {
    let (app, _, dir) = test_app();
    let cookie = login(&app).await;
    let body = multipart_body("foo.jar", &[0xde, 0xad], &[]);
    upload(&app, Some(&cookie), "name=foo&author=bar&version=1.0", body).await;

    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let restarted = cubirepo_api::app(cubirepo_api::bootstrap::bootstrap(config, None).unwrap());
    let response = get(&restarted, "/bar/foo/foo_1.0.jar", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, vec![0xde, 0xad]);
}

// -- Build Feed Record --------------------------------------------------------

#[tokio::test]
async fn test_feed_record_is_served_listed_and_protected() {
    let (app, state, _dir) = test_app();
    state
        .registry
        .add(cubirepo_api::bootstrap::feed_record(Arc::new(StaticFeed(vec![0xca, 0xfe]))));
    let cookie = login(&app).await;

    let response = get(&app, "/cubition/server/server_latest.jar", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, vec![0xca, 0xfe]);

    let response = get(&app, "/cubition/server/server_latest.json", None).await;
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["mainClass"], "net.cubition.server.ServerBaseController");

    let response = get(&app, "/manage/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(listing[0]["download"], "/cubition/server/server_latest.jar");
    assert_eq!(listing[0]["deletable"], false);
    assert_eq!(listing[0]["type"], "jar");

    let response = get(
        &app,
        "/delete/?author=cubition&name=server&version=latest",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.registry.len(), 1);
}

#[tokio::test]
async fn test_unreachable_feed_is_503() {
    let (app, state, _dir) = test_app();
    state
        .registry
        .add(cubirepo_api::bootstrap::feed_record(Arc::new(DownFeed)));

    let response = get(&app, "/cubition/server/server_latest.jar", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Metadata does not touch the feed.
    let response = get(&app, "/cubition/server/server_latest.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
