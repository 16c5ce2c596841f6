// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store: users and outstanding OTP challenges.
//!
//! The store is a capability injected at startup. Two implementations
//! exist behind the same trait: a durable Firestore-backed one and an
//! in-process one for sample mode and tests. They are never mixed.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{OtpChallenge, OtpPurpose, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const OTP_CHALLENGES: &str = "otp_challenges";
}

/// Storage operations needed by the authentication core.
///
/// `upsert_challenge` and `increment_attempts` must be atomic per
/// (email, purpose): two concurrent issues must not leave two live
/// challenges, and two concurrent wrong guesses must both be counted.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError>;
    async fn create_user(&self, user: &User) -> Result<(), AppError>;
    async fn update_user(&self, user: &User) -> Result<(), AppError>;

    async fn get_challenge(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>, AppError>;
    /// Insert-or-replace the challenge keyed by (email, purpose).
    async fn upsert_challenge(&self, challenge: &OtpChallenge) -> Result<(), AppError>;
    /// Atomically bump the attempt counter, returning the new value.
    async fn increment_attempts(&self, email: &str, purpose: OtpPurpose)
        -> Result<u32, AppError>;
    async fn delete_challenge(&self, email: &str, purpose: OtpPurpose) -> Result<(), AppError>;
}
