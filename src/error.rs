// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("No account found with this email")]
    NoSuchAccount,

    #[error("OTP not found")]
    OtpNotFound,

    #[error("OTP expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Signup data missing")]
    SignupDataMissing,

    #[error("Too many attempts")]
    TooManyAttempts,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                Some(msg.clone()),
            ),
            AppError::EmailAlreadyRegistered => (
                StatusCode::BAD_REQUEST,
                "email_already_registered",
                Some("Email already registered".to_string()),
            ),
            AppError::NoSuchAccount => (
                StatusCode::BAD_REQUEST,
                "no_such_account",
                Some("No account found with this email".to_string()),
            ),
            AppError::OtpNotFound => (
                StatusCode::BAD_REQUEST,
                "otp_not_found",
                Some("OTP not found. Start the flow again.".to_string()),
            ),
            AppError::OtpExpired => (
                StatusCode::BAD_REQUEST,
                "otp_expired",
                Some("OTP expired".to_string()),
            ),
            AppError::InvalidOtp => (
                StatusCode::BAD_REQUEST,
                "invalid_otp",
                Some("Invalid OTP".to_string()),
            ),
            AppError::SignupDataMissing => (
                StatusCode::BAD_REQUEST,
                "signup_data_missing",
                Some("Signup data missing. Please start signup again.".to_string()),
            ),
            AppError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_attempts",
                Some("Too many attempts. Request a new code.".to_string()),
            ),
            // Missing, malformed and expired credentials all look the same
            // to the client.
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::NotConfigured(what) => (
                StatusCode::NOT_IMPLEMENTED,
                "not_configured",
                Some(format!("{what} is not configured")),
            ),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream provider error");
                (StatusCode::BAD_GATEWAY, "upstream_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
