// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth identity federation.
//!
//! Runs the authorization-code flow and reconciles the asserted Google
//! profile into a local account: match on the Google subject ID first,
//! then merge by email, then create. The browser-facing redirect logic
//! lives in the auth routes; this service owns the protocol legwork.

use crate::config::Config;
use crate::db::AuthStore;
use crate::error::AppError;
use crate::models::User;
use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::NaiveDate;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// How long an issued state parameter stays acceptable.
const MAX_STATE_AGE_MS: u128 = 10 * 60 * 1000;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Profile asserted by Google's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Stable Google subject ID
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleAuthService {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    state_key: Vec<u8>,
}

impl GoogleAuthService {
    /// Build the service when both OAuth halves are configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Option<Self>> {
        let (Some(client_id), Some(client_secret)) = (
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
        ) else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building OAuth HTTP client")?;

        Ok(Some(Self {
            http,
            client_id,
            client_secret,
            state_key: config.oauth_state_key.clone(),
        }))
    }

    /// Authorization URL to bounce the browser to.
    pub fn authorize_url(&self, redirect_uri: &str) -> Result<String, AppError> {
        let state = sign_state(&self.state_key)?;

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile&state={}",
            AUTH_ENDPOINT,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            state
        ))
    }

    /// Check the state parameter echoed back by the callback.
    pub fn state_is_valid(&self, state: &str) -> bool {
        verify_state(state, &self.state_key)
    }

    /// Exchange the authorization code and fetch the asserted profile.
    pub async fn fetch_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleProfile, AppError> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Google token exchange failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("Google token exchange rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Google token response malformed: {e}")))?;

        self.http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Google userinfo fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Upstream(format!("Google userinfo rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Google userinfo malformed: {e}")))
    }

    /// Reconcile an asserted profile into a local account.
    ///
    /// Order matters: an already-linked subject wins, then accounts
    /// merge by email, then a fresh account is created. Unverified
    /// emails are refused outright; linking one onto an existing
    /// account would hand that account to whoever controls the Google
    /// profile.
    pub async fn resolve(
        &self,
        store: &dyn AuthStore,
        profile: GoogleProfile,
    ) -> Result<User, AppError> {
        if let Some(user) = store.find_user_by_google_id(&profile.sub).await? {
            return Ok(user);
        }

        let email = profile
            .email
            .as_deref()
            .ok_or_else(|| AppError::Upstream("Google profile has no email".to_string()))?
            .to_lowercase();

        if !profile.email_verified {
            return Err(AppError::Upstream(format!(
                "Google profile email is unverified: {email}"
            )));
        }

        if let Some(mut user) = store.find_user_by_email(&email).await? {
            user.google_id = Some(profile.sub.clone());
            if user.profile_image_url.is_none() {
                user.profile_image_url = profile.picture.clone();
            }
            user.updated_at = chrono::Utc::now().to_rfc3339();
            store.update_user(&user).await?;
            tracing::info!(email = %email, user_id = %user.id, "Linked Google identity");
            return Ok(user);
        }

        let mut user = User::new(
            profile.name.unwrap_or_else(|| "Google User".to_string()),
            // Google asserts no birth date; federated accounts get a fixed one.
            NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid constant date"),
            email.clone(),
        );
        user.email_verified = true;
        user.google_id = Some(profile.sub);
        user.profile_image_url = profile.picture;
        store.create_user(&user).await?;
        tracing::info!(email = %email, user_id = %user.id, "Created federated account");

        Ok(user)
    }
}

/// Produce a signed state parameter: `timestamp_hex|signature_hex`,
/// base64url-encoded.
fn sign_state(secret: &[u8]) -> Result<String, AppError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let payload = format!("{timestamp:x}");

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify the signature and freshness of a state parameter.
fn verify_state(state: &str, secret: &[u8]) -> bool {
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(state) else {
        return false;
    };
    let Ok(state_str) = String::from_utf8(bytes) else {
        return false;
    };

    let Some((timestamp_hex, signature_hex)) = state_str.split_once('|') else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(timestamp_hex.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    let Ok(timestamp) = u128::from_str_radix(timestamp_hex, 16) else {
        return false;
    };
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    now.saturating_sub(timestamp) <= MAX_STATE_AGE_MS
}
