// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-time passcode challenge records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a challenge proves once verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Signup,
    Login,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Signup => "signup",
            OtpPurpose::Login => "login",
        }
    }
}

/// A single outstanding verification challenge.
///
/// At most one challenge exists per (email, purpose); issuing a new one
/// replaces the record wholesale, invalidating the previous code. The
/// record is deleted only on successful verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallenge {
    /// Lowercase email the code was sent to
    pub email: String,
    pub purpose: OtpPurpose,
    /// Salted digest of the code, `"<salt hex>$<sha256 hex>"`.
    /// The plaintext code never touches the store.
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Failed verification count; the challenge dies at the cap
    pub attempts: u32,
    /// Staged profile data, carried until signup verification succeeds
    pub name: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    /// When the challenge was issued (RFC 3339)
    pub created_at: String,
}
