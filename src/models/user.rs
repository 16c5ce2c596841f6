// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// User account stored in the credential store.
///
/// Email is globally unique and always stored lowercase; callers
/// normalize before any lookup or write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable account ID (UUID v4, also used as document ID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Date of birth
    pub dob: NaiveDate,
    /// Lowercase email address
    pub email: String,
    /// Absent for federated accounts
    pub password_hash: Option<String>,
    /// Set on OTP signup and on federated account creation
    pub email_verified: bool,
    /// Google subject ID, present once a Google identity is linked
    pub google_id: Option<String>,
    /// Profile picture URL from the federation provider
    pub profile_image_url: Option<String>,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Last mutation timestamp (RFC 3339)
    pub updated_at: String,
}

impl User {
    /// Build a new account record with fresh id and timestamps.
    pub fn new(name: String, dob: NaiveDate, email: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            dob,
            email: email.to_lowercase(),
            password_hash: None,
            email_verified: false,
            google_id: None,
            profile_image_url: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
