// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CloudNotes backend: email-OTP and Google OAuth authentication in
//! front of a personal notes store.
//!
//! This crate is the authentication core: OTP challenge lifecycle,
//! JWT session issuance and the cookie transport that gates every
//! protected route.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::AuthStore;
use services::{GoogleAuthService, OtpService, TokenService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AuthStore>,
    pub otp: OtpService,
    pub tokens: TokenService,
    /// Present only when federation is configured.
    pub google: Option<GoogleAuthService>,
}
