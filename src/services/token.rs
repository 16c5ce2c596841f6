// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuance and verification.
//!
//! Tokens are self-contained HS256 JWTs; verification is a pure
//! function of (token, secret, clock) with no store lookup, so any
//! instance can authenticate any request.

use crate::error::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default session lifetime.
pub const SESSION_DAYS: u64 = 7;
/// "Keep me signed in" session lifetime.
pub const EXTENDED_SESSION_DAYS: u64 = 30;

/// Claims carried by a session token. Claims are signed, not
/// encrypted; nothing secret goes in here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthClaims {
    /// Subject (account ID)
    pub sub: String,
    /// Account email at issuance time
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Mints and verifies session tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
}

impl TokenService {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Lifetime in days for the given tier.
    pub fn session_days(extended: bool) -> u64 {
        if extended {
            EXTENDED_SESSION_DAYS
        } else {
            SESSION_DAYS
        }
    }

    /// Create a session token for a user.
    pub fn mint(&self, user_id: &str, email: &str, extended: bool) -> Result<String, AppError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs() as usize;

        let lifetime = Self::session_days(extended) as usize * 24 * 60 * 60;

        let claims = AuthClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + lifetime,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    /// Verify a token and return its claims. Malformed, mis-signed and
    /// expired tokens all collapse to `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<AuthClaims, AppError> {
        let key = DecodingKey::from_secret(&self.secret);
        let validation = Validation::new(Algorithm::HS256);

        decode::<AuthClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test_signing_key_32_bytes_long!!".to_vec())
    }

    #[test]
    fn test_mint_verify_roundtrip() {
        let tokens = service();
        let token = tokens.mint("user-1", "ann@x.com", false).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "ann@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expiry_tiers() {
        let tokens = service();

        let default_tier = tokens.mint("u", "a@x.com", false).unwrap();
        let extended_tier = tokens.mint("u", "a@x.com", true).unwrap();

        let default_claims = tokens.verify(&default_tier).unwrap();
        let extended_claims = tokens.verify(&extended_tier).unwrap();

        assert_eq!(
            default_claims.exp - default_claims.iat,
            7 * 24 * 60 * 60,
            "default tier should be 7 days"
        );
        assert_eq!(
            extended_claims.exp - extended_claims.iat,
            30 * 24 * 60 * 60,
            "extended tier should be 30 days"
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().mint("user-1", "ann@x.com", false).unwrap();

        let other = TokenService::new(b"another_signing_key_entirely!!!!".to_vec());
        assert!(matches!(
            other.verify(&token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = b"test_signing_key_32_bytes_long!!".to_vec();

        // Forge claims that expired an hour ago.
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;
        let claims = AuthClaims {
            sub: "user-1".to_string(),
            email: "ann@x.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&secret),
        )
        .unwrap();

        let tokens = TokenService::new(secret);
        assert!(matches!(
            tokens.verify(&token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            service().verify("not-a-jwt"),
            Err(AppError::Unauthorized)
        ));
    }
}
