// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Two postures exist: sample mode (in-process store, permissive
//! defaults, useful for demos and tests) and normal mode, where the
//! signing secret, client origin and Firestore project are required.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Browser client origin (CORS allowlist, OAuth redirect target)
    pub client_origin: String,
    /// This API's own externally visible origin (OAuth redirect_uri)
    pub server_url: String,
    /// Use the in-process store and permissive defaults
    pub sample_mode: bool,
    /// Production cookie/CORS posture (Secure, SameSite=None)
    pub production: bool,
    /// GCP project ID for Firestore (unused in sample mode)
    pub gcp_project_id: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// HMAC key for the OAuth state parameter
    pub oauth_state_key: Vec<u8>,
    /// Google OAuth client ID (public)
    pub google_client_id: Option<String>,
    /// Google OAuth client secret
    pub google_client_secret: Option<String>,
    /// Verified sender address; SES delivery is enabled when present
    pub mail_from: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In sample mode everything falls back to a local-dev default.
    /// Otherwise JWT_SECRET, CLIENT_ORIGIN and GCP_PROJECT_ID are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let sample_mode = env::var("SAMPLE_MODE").is_ok_and(|v| v == "true");
        let production = env::var("APP_ENV").is_ok_and(|v| v == "production");

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .unwrap_or(5000);

        let jwt_secret = if sample_mode {
            env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string())
        } else {
            env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?
        }
        .into_bytes();

        let client_origin = if sample_mode {
            env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string())
        } else {
            env::var("CLIENT_ORIGIN").map_err(|_| ConfigError::Missing("CLIENT_ORIGIN"))?
        };

        let gcp_project_id = if sample_mode {
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "sample-mode".to_string())
        } else {
            env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
        };

        // The state key may be rotated independently of the JWT secret,
        // but falls back to it so one secret is enough to run.
        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(String::into_bytes)
            .unwrap_or_else(|_| jwt_secret.clone());

        Ok(Self {
            port,
            server_url: env::var("SERVER_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            client_origin,
            sample_mode,
            production,
            gcp_project_id,
            jwt_secret,
            oauth_state_key,
            google_client_id: env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty()),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),
            mail_from: env::var("MAIL_FROM").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Google federation is enabled only when both halves are present.
    pub fn google_enabled(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 5000,
            client_origin: "http://localhost:5173".to_string(),
            server_url: "http://localhost:5000".to_string(),
            sample_mode: true,
            production: false,
            gcp_project_id: "test-project".to_string(),
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            oauth_state_key: b"test_state_key".to_vec(),
            google_client_id: None,
            google_client_secret: None,
            mail_from: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
