// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-time passcode engine.
//!
//! Issues and verifies 6-digit codes for signup and login. Codes are
//! stored only as salted SHA-256 digests, expire after ten minutes and
//! die after five failed guesses. A challenge is single-use: the record
//! is deleted the moment a code verifies.

use crate::db::AuthStore;
use crate::error::AppError;
use crate::models::{OtpChallenge, OtpPurpose, User};
use crate::services::mailer::Mailer;
use chrono::{NaiveDate, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

const OTP_TTL_MINUTES: i64 = 10;
const MAX_ATTEMPTS: u32 = 5;
const SALT_LEN: usize = 16;

/// Profile data staged on a signup challenge until the code verifies.
#[derive(Debug, Clone)]
pub struct SignupProfile {
    pub name: String,
    pub dob: NaiveDate,
}

/// OTP issuance and verification.
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn AuthStore>,
    mailer: Mailer,
}

impl OtpService {
    pub fn new(store: Arc<dyn AuthStore>, mailer: Mailer) -> Self {
        Self { store, mailer }
    }

    /// Issue (or re-issue) a challenge and send the code.
    ///
    /// Login requires an existing account; signup requires the email to
    /// be free. The upsert replaces any outstanding challenge for the
    /// same (email, purpose), so only the newest code verifies. The
    /// mail send happens after the challenge is persisted and its
    /// failure does not fail the call.
    pub async fn issue_challenge(
        &self,
        email: &str,
        purpose: OtpPurpose,
        staged: Option<SignupProfile>,
    ) -> Result<(), AppError> {
        let email = email.to_lowercase();

        match purpose {
            OtpPurpose::Signup => {
                if self.store.find_user_by_email(&email).await?.is_some() {
                    return Err(AppError::EmailAlreadyRegistered);
                }
            }
            OtpPurpose::Login => {
                if self.store.find_user_by_email(&email).await?.is_none() {
                    return Err(AppError::NoSuchAccount);
                }
            }
        }

        let code = generate_code()?;
        let (name, dob) = match staged {
            Some(profile) => (Some(profile.name), Some(profile.dob)),
            None => (None, None),
        };

        let challenge = OtpChallenge {
            email: email.clone(),
            purpose,
            code_hash: hash_code(&code)?,
            expires_at: Utc::now() + chrono::Duration::minutes(OTP_TTL_MINUTES),
            attempts: 0,
            name,
            dob,
            created_at: Utc::now().to_rfc3339(),
        };

        self.store.upsert_challenge(&challenge).await?;

        tracing::info!(email = %email, purpose = purpose.as_str(), "OTP challenge issued");

        // The challenge is already valid; a lost email just means the
        // user requests a resend.
        if let Err(e) = self.mailer.send_otp(&email, &code).await {
            tracing::warn!(email = %email, error = %e, "OTP delivery failed");
        }

        Ok(())
    }

    /// Verify a submitted code. On success the challenge is consumed
    /// and the resolved (or newly created) account is returned.
    pub async fn verify_challenge(
        &self,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<User, AppError> {
        let email = email.to_lowercase();

        let challenge = self
            .store
            .get_challenge(&email, purpose)
            .await?
            .ok_or(AppError::OtpNotFound)?;

        // Expiry is checked before attempt accounting: a guess against
        // a dead challenge is not counted.
        if challenge.expires_at < Utc::now() {
            return Err(AppError::OtpExpired);
        }

        if challenge.attempts >= MAX_ATTEMPTS {
            return Err(AppError::TooManyAttempts);
        }

        if !verify_code(code, &challenge.code_hash) {
            let attempts = self.store.increment_attempts(&email, purpose).await?;
            tracing::info!(
                email = %email,
                purpose = purpose.as_str(),
                attempts,
                "OTP mismatch"
            );
            return Err(AppError::InvalidOtp);
        }

        let user = match purpose {
            OtpPurpose::Signup => {
                let (Some(name), Some(dob)) = (challenge.name, challenge.dob) else {
                    return Err(AppError::SignupDataMissing);
                };

                // The account may have appeared since the challenge was
                // issued (e.g. a federated login with the same email).
                if self.store.find_user_by_email(&email).await?.is_some() {
                    return Err(AppError::EmailAlreadyRegistered);
                }

                let mut user = User::new(name, dob, email.clone());
                user.email_verified = true;
                self.store.create_user(&user).await?;
                tracing::info!(email = %email, user_id = %user.id, "Account created");
                user
            }
            OtpPurpose::Login => self
                .store
                .find_user_by_email(&email)
                .await?
                .ok_or(AppError::NoSuchAccount)?,
        };

        // Single-use: the consumed challenge is gone even if the client
        // replays the same code.
        self.store.delete_challenge(&email, purpose).await?;

        Ok(user)
    }
}

/// Uniform random 6-digit code, zero-padded.
fn generate_code() -> Result<String, AppError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; 8];
    rng.fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("RNG failure")))?;
    let n = u64::from_le_bytes(buf) % 1_000_000;
    Ok(format!("{n:06}"))
}

/// Salted SHA-256 digest, `"<salt hex>$<digest hex>"`.
fn hash_code(code: &str) -> Result<String, AppError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("RNG failure")))?;

    Ok(format!(
        "{}${}",
        hex::encode(salt),
        hex::encode(digest(&salt, code))
    ))
}

/// Constant-time comparison against a stored digest.
fn verify_code(code: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };

    digest(&salt, code).ct_eq(expected.as_slice()).into()
}

fn digest(salt: &[u8], code: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(code.as_bytes());
    hasher.finalize().to_vec()
}
