// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie attribute tests.
//!
//! These verify the cookie posture in both environments and that the
//! logout removal cookie matches the creation attributes; mismatched
//! attributes would leave the session cookie behind in the browser.

use axum::http::StatusCode;
use cloudnotes::config::Config;
use serde_json::json;

mod common;

use common::{create_test_app, create_test_app_with_config, last_otp, post_json, set_cookie_headers};

fn production_config() -> Config {
    Config {
        production: true,
        client_origin: "https://cloudnotes.example.com".to_string(),
        ..Config::test_default()
    }
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn login_verify_cookie(
    config: Config,
    keep_signed_in: bool,
) -> String {
    let (app, _state, outbox) = create_test_app_with_config(config);

    post_json(
        &app,
        "/auth/signup/start",
        json!({ "name": "Ann", "dob": "2000-01-01", "email": "ann@x.com" }),
    )
    .await;
    let otp = last_otp(&outbox);
    post_json(
        &app,
        "/auth/signup/verify",
        json!({ "email": "ann@x.com", "otp": otp }),
    )
    .await;

    post_json(&app, "/auth/login/start", json!({ "email": "ann@x.com" })).await;
    let otp = last_otp(&outbox);
    let response = post_json(
        &app,
        "/auth/login/verify",
        json!({ "email": "ann@x.com", "otp": otp, "keepSignedIn": keep_signed_in }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    find_cookie(&set_cookie_headers(&response), "cloudnotes_token")
}

#[tokio::test]
async fn test_session_cookie_dev_attributes() {
    let cookie = login_verify_cookie(Config::test_default(), false).await;

    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
    // Default tier: 7 days
    assert!(cookie.contains(&format!("Max-Age={}", 7 * 24 * 60 * 60)));
}

#[tokio::test]
async fn test_session_cookie_production_attributes() {
    let cookie = login_verify_cookie(production_config(), false).await;

    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Path=/"));
}

#[tokio::test]
async fn test_keep_signed_in_stretches_cookie_lifetime() {
    let cookie = login_verify_cookie(Config::test_default(), true).await;
    assert!(cookie.contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));
}

#[tokio::test]
async fn test_logout_removal_cookie_matches_creation_attributes() {
    let (app, _state, _outbox) = create_test_app();

    let response = post_json(&app, "/auth/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = find_cookie(&set_cookie_headers(&response), "cloudnotes_token");
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_removal_cookie_production_attributes() {
    let (app, _state, _outbox) = create_test_app_with_config(production_config());

    let response = post_json(&app, "/auth/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = find_cookie(&set_cookie_headers(&response), "cloudnotes_token");
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
}

#[tokio::test]
async fn test_signup_verify_sets_default_tier_cookie() {
    let (app, _state, outbox) = create_test_app();

    post_json(
        &app,
        "/auth/signup/start",
        json!({ "name": "Ann", "dob": "2000-01-01", "email": "ann@x.com" }),
    )
    .await;
    let otp = last_otp(&outbox);
    let response = post_json(
        &app,
        "/auth/signup/verify",
        json!({ "email": "ann@x.com", "otp": otp }),
    )
    .await;

    let cookie = find_cookie(&set_cookie_headers(&response), "cloudnotes_token");
    assert!(cookie.contains(&format!("Max-Age={}", 7 * 24 * 60 * 60)));
}
