// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use cloudnotes::config::Config;
use cloudnotes::db::{AuthStore, MemoryStore};
use cloudnotes::routes::create_router;
use cloudnotes::services::mailer::{Mailer, Outbox};
use cloudnotes::services::{OtpService, TokenService};
use cloudnotes::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app over the in-process store with a capture mailer.
/// Returns the router, the shared state and the mail outbox.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>, Outbox) {
    create_test_app_with_config(Config::test_default())
}

/// Same, with a caller-supplied config (e.g. production posture).
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>, Outbox) {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryStore::new());
    let (mailer, outbox) = Mailer::capture();

    let state = Arc::new(AppState {
        otp: OtpService::new(store.clone(), mailer),
        tokens: TokenService::new(config.jwt_secret.clone()),
        google: None,
        store,
        config,
    });

    (create_router(state.clone()), state, outbox)
}

/// POST a JSON body and return the response.
#[allow(dead_code)]
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> Response<axum::body::Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// GET with an optional session cookie.
#[allow(dead_code)]
pub async fn get_with_cookie(
    app: &Router,
    uri: &str,
    cookie: Option<&str>,
) -> Response<axum::body::Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, format!("cloudnotes_token={cookie}"));
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Parse the response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All Set-Cookie header values on a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response<axum::body::Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Extract the session token value from a response's Set-Cookie headers.
#[allow(dead_code)]
pub fn session_token(response: &Response<axum::body::Body>) -> String {
    let headers = set_cookie_headers(response);
    let cookie = headers
        .iter()
        .find(|value| value.starts_with("cloudnotes_token="))
        .unwrap_or_else(|| panic!("missing session Set-Cookie header: {headers:?}"));

    cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("cloudnotes_token=")
        .to_string()
}

/// The most recent OTP code captured by the mailer.
#[allow(dead_code)]
pub fn last_otp(outbox: &Outbox) -> String {
    outbox
        .lock()
        .unwrap()
        .last()
        .expect("no OTP was sent")
        .code
        .clone()
}

/// Assert a JSON error envelope with the given status and error code.
#[allow(dead_code)]
pub async fn assert_error(
    response: Response<axum::body::Body>,
    status: StatusCode,
    error: &str,
) {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["error"], error, "unexpected error body: {body}");
}
