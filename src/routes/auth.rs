// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: OTP signup/login, session lifecycle, Google OAuth.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{removal_cookie, session_cookie, AuthUser};
use crate::models::{OtpPurpose, User};
use crate::services::SignupProfile;
use crate::AppState;

/// Public auth routes (no session required).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup/start", post(signup_start))
        .route("/auth/signup/verify", post(signup_verify))
        .route("/auth/login/start", post(login_start))
        .route("/auth/login/verify", post(login_verify))
        .route("/auth/login", get(login_hint))
        .route("/auth/logout", post(logout))
        .route("/auth/google", get(google_start))
        .route("/auth/google/callback", get(google_callback))
}

/// Routes behind the session gate (middleware applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/me", get(me))
}

// ─── Request/Response Payloads ───────────────────────────────

#[derive(Deserialize, Validate)]
pub struct SignupStartRequest {
    #[validate(length(min = 2, max = 80))]
    pub name: String,
    pub dob: NaiveDate,
    #[validate(email)]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct SignupVerifyRequest {
    #[validate(email)]
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginStartRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginVerifyRequest {
    #[validate(email)]
    pub email: String,
    pub otp: String,
    #[serde(default, rename = "keepSignedIn")]
    pub keep_signed_in: bool,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public view of an account.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

fn check(payload: &impl Validate) -> Result<()> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

fn check_otp_format(otp: &str) -> Result<()> {
    if otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "otp must be a 6-digit code".to_string(),
        ))
    }
}

// ─── OTP Signup ──────────────────────────────────────────────

/// Start signup: stage the profile and send a code.
async fn signup_start(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupStartRequest>,
) -> Result<Json<MessageResponse>> {
    check(&payload)?;

    state
        .otp
        .issue_challenge(
            &payload.email,
            OtpPurpose::Signup,
            Some(SignupProfile {
                name: payload.name,
                dob: payload.dob,
            }),
        )
        .await?;

    Ok(message("OTP sent"))
}

/// Finish signup: the account is created here, with a session attached.
async fn signup_verify(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<SignupVerifyRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    check(&payload)?;
    check_otp_format(&payload.otp)?;

    let user = state
        .otp
        .verify_challenge(&payload.email, OtpPurpose::Signup, &payload.otp)
        .await?;

    let token = state.tokens.mint(&user.id, &user.email, false)?;
    let jar = jar.add(session_cookie(state.config.production, token, false));

    Ok((
        jar,
        Json(AuthResponse {
            user: (&user).into(),
        }),
    ))
}

// ─── OTP Login ───────────────────────────────────────────────

/// Start login for an existing account.
async fn login_start(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginStartRequest>,
) -> Result<Json<MessageResponse>> {
    check(&payload)?;

    state
        .otp
        .issue_challenge(&payload.email, OtpPurpose::Login, None)
        .await?;

    Ok(message("OTP sent"))
}

/// Finish login. `keepSignedIn` stretches the session to the long tier.
async fn login_verify(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginVerifyRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    check(&payload)?;
    check_otp_format(&payload.otp)?;

    let user = state
        .otp
        .verify_challenge(&payload.email, OtpPurpose::Login, &payload.otp)
        .await?;

    let token = state
        .tokens
        .mint(&user.id, &user.email, payload.keep_signed_in)?;
    let jar = jar.add(session_cookie(
        state.config.production,
        token,
        payload.keep_signed_in,
    ));

    Ok((
        jar,
        Json(AuthResponse {
            user: (&user).into(),
        }),
    ))
}

async fn login_hint() -> Json<MessageResponse> {
    message("Login endpoint exists. Use POST /auth/login/start to begin login.")
}

// ─── Session ─────────────────────────────────────────────────

/// Logout is stateless: there is nothing server-side to invalidate,
/// the cookie is simply removed.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(removal_cookie(state.config.production));
    (jar, message("Logged out"))
}

/// Current account, resolved fresh from the store.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<AuthResponse>> {
    let user = state
        .store
        .find_user_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(AuthResponse {
        user: (&user).into(),
    }))
}

// ─── Google OAuth ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GoogleCallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn callback_redirect_uri(state: &AppState) -> String {
    format!("{}/auth/google/callback", state.config.server_url)
}

/// Bounce the browser to Google's consent screen.
async fn google_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let google = state
        .google
        .as_ref()
        .ok_or(AppError::NotConfigured("Google OAuth"))?;

    let url = google.authorize_url(&callback_redirect_uri(&state))?;

    tracing::info!("Starting Google OAuth flow");
    Ok(Redirect::temporary(&url))
}

/// OAuth callback. This is a browser-redirect flow: every failure lands
/// the user back on the client's login page with an error marker, never
/// on a raw API error.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<GoogleCallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let google = state
        .google
        .as_ref()
        .ok_or(AppError::NotConfigured("Google OAuth"))?;

    let client_origin = state.config.client_origin.clone();
    let failure = move |reason: &str| {
        tracing::warn!(reason = %reason, "Google OAuth callback failed");
        Redirect::temporary(&format!("{client_origin}/login?error=google_auth_failed"))
    };

    if let Some(error) = params.error {
        return Ok((jar, failure(&error)));
    }

    match params.state {
        Some(ref s) if google.state_is_valid(s) => {}
        _ => return Ok((jar, failure("invalid_state"))),
    }

    let Some(code) = params.code else {
        return Ok((jar, failure("missing_code")));
    };

    let profile = match google
        .fetch_profile(&code, &callback_redirect_uri(&state))
        .await
    {
        Ok(profile) => profile,
        Err(e) => return Ok((jar, failure(&e.to_string()))),
    };

    let user = match google.resolve(state.store.as_ref(), profile).await {
        Ok(user) => user,
        Err(e) => return Ok((jar, failure(&e.to_string()))),
    };

    let token = state.tokens.mint(&user.id, &user.email, false)?;
    let jar = jar.add(session_cookie(state.config.production, token, false));

    tracing::info!(user_id = %user.id, "Google OAuth login complete");

    let destination = format!("{}/auth/callback", state.config.client_origin);
    Ok((jar, Redirect::temporary(&destination)))
}
