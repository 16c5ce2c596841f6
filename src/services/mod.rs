// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google;
pub mod mailer;
pub mod otp;
pub mod token;

pub use google::{GoogleAuthService, GoogleProfile};
pub use mailer::Mailer;
pub use otp::{OtpService, SignupProfile};
pub use token::{AuthClaims, TokenService};
