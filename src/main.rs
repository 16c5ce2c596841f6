// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CloudNotes API Server
//!
//! Email-OTP and Google OAuth authentication for the CloudNotes client,
//! backed by Firestore (or an in-process store in sample mode).

use cloudnotes::{
    config::Config,
    db::{AuthStore, FirestoreStore, MemoryStore},
    services::{GoogleAuthService, Mailer, OtpService, TokenService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        sample_mode = config.sample_mode,
        "Starting CloudNotes API"
    );

    // Select the credential store: in-process for sample mode,
    // Firestore otherwise. Never both.
    let store: Arc<dyn AuthStore> = if config.sample_mode {
        tracing::info!("Sample mode: using in-process store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            FirestoreStore::new(&config.gcp_project_id)
                .await
                .expect("Failed to connect to Firestore"),
        )
    };

    let mailer = Mailer::from_config(&config).await;

    let google = GoogleAuthService::from_config(&config)
        .expect("Failed to initialize Google OAuth client");
    if google.is_none() {
        tracing::info!("Google OAuth not configured; federation routes answer 501");
    }

    // Build shared state
    let state = Arc::new(AppState {
        otp: OtpService::new(store.clone(), mailer),
        tokens: TokenService::new(config.jwt_secret.clone()),
        google,
        store,
        config: config.clone(),
    });

    // Build router
    let app = cloudnotes::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cloudnotes=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
