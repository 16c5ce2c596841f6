// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process credential store for sample mode and tests.
//!
//! Users are keyed by lowercase email (the uniqueness invariant),
//! challenges by (email, purpose). DashMap's per-entry locking gives
//! the upsert and increment operations their required atomicity.

use crate::db::AuthStore;
use crate::error::AppError;
use crate::models::{OtpChallenge, OtpPurpose, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, User>>,
    challenges: Arc<DashMap<(String, OtpPurpose), OtpChallenge>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user record, simulating out-of-band deletion in tests.
    #[cfg(test)]
    pub fn remove_user(&self, email: &str) {
        self.users.remove(&email.to_lowercase());
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&email.to_lowercase()).map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().google_id.as_deref() == Some(google_id))
            .map(|entry| entry.value().clone()))
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Database(format!(
                "user already exists: {}",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        match self.users.get_mut(&user.email) {
            Some(mut entry) => {
                *entry = user.clone();
                Ok(())
            }
            None => Err(AppError::Database(format!(
                "cannot update missing user: {}",
                user.email
            ))),
        }
    }

    async fn get_challenge(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>, AppError> {
        Ok(self
            .challenges
            .get(&(email.to_lowercase(), purpose))
            .map(|c| c.clone()))
    }

    async fn upsert_challenge(&self, challenge: &OtpChallenge) -> Result<(), AppError> {
        self.challenges.insert(
            (challenge.email.clone(), challenge.purpose),
            challenge.clone(),
        );
        Ok(())
    }

    async fn increment_attempts(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<u32, AppError> {
        let mut entry = self
            .challenges
            .get_mut(&(email.to_lowercase(), purpose))
            .ok_or(AppError::OtpNotFound)?;
        entry.attempts += 1;
        Ok(entry.attempts)
    }

    async fn delete_challenge(&self, email: &str, purpose: OtpPurpose) -> Result<(), AppError> {
        self.challenges.remove(&(email.to_lowercase(), purpose));
        Ok(())
    }
}
