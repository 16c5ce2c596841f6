// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed credential store.
//!
//! Users live in `users` keyed by account ID; challenges live in
//! `otp_challenges` keyed by a composite `<email>|<purpose>` document
//! ID, which makes the issue-time upsert a single-document write.

use crate::db::{collections, AuthStore};
use crate::error::AppError;
use crate::models::{OtpChallenge, OtpPurpose, User};
use async_trait::async_trait;

/// Firestore client wrapper.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

/// Document ID for a challenge. Email is percent-encoded so the
/// composite key stays a valid single path segment.
fn challenge_doc_id(email: &str, purpose: OtpPurpose) -> String {
    format!("{}|{}", urlencoding::encode(email), purpose.as_str())
}

impl FirestoreStore {
    /// Connect to Firestore.
    ///
    /// For local development with the emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

}

#[async_trait]
impl AuthStore for FirestoreStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let google_id = google_id.to_string();
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("google_id").eq(google_id.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let _: User = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_challenge(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::OTP_CHALLENGES)
            .obj()
            .one(challenge_doc_id(email, purpose))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_challenge(&self, challenge: &OtpChallenge) -> Result<(), AppError> {
        // A single-document write keyed by (email, purpose): replaces any
        // prior challenge atomically.
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::OTP_CHALLENGES)
            .document_id(challenge_doc_id(&challenge.email, challenge.purpose))
            .object(challenge)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn increment_attempts(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<u32, AppError> {
        let doc_id = challenge_doc_id(email, purpose);

        // Read-modify-write inside a transaction: concurrent wrong guesses
        // are retried by Firestore with fresh data, so both are counted.
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<OtpChallenge> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::OTP_CHALLENGES)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read challenge in transaction: {}", e))
            })?;

        let Some(mut challenge) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::OtpNotFound);
        };

        challenge.attempts += 1;

        self.client
            .fluent()
            .update()
            .in_col(collections::OTP_CHALLENGES)
            .document_id(&doc_id)
            .object(&challenge)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add increment to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(challenge.attempts)
    }

    async fn delete_challenge(&self, email: &str, purpose: OtpPurpose) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::OTP_CHALLENGES)
            .document_id(challenge_doc_id(email, purpose))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_doc_id_is_single_segment() {
        let id = challenge_doc_id("ann+notes@x.com", OtpPurpose::Signup);
        assert!(!id.contains('/'));
        assert!(id.ends_with("|signup"));

        assert_ne!(
            challenge_doc_id("a@x.com", OtpPurpose::Signup),
            challenge_doc_id("a@x.com", OtpPurpose::Login)
        );
    }
}
