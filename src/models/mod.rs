// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod otp;
pub mod user;

pub use otp::{OtpChallenge, OtpPurpose};
pub use user::User;
