// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session transport: the token travels in an HTTP-only cookie.
//!
//! The cookie is the only credential channel; it is set on successful
//! verification (or OAuth callback), replayed by the browser, and read
//! back here. Missing, malformed and expired tokens are all the same
//! 401 to the client.

use crate::error::AppError;
use crate::services::token::TokenService;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "cloudnotes_token";

/// Authenticated principal extracted from the session token.
/// Request-scoped: inserted as an extension, never shared.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

/// Middleware that requires a valid session cookie.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify(&token)?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Build the session cookie for a freshly minted token.
///
/// Max-Age mirrors the token's own expiry tier. Production runs the
/// client and API on different sites, hence SameSite=None there (which
/// requires Secure); development stays on Lax over plain HTTP.
pub fn session_cookie(production: bool, token: String, extended: bool) -> Cookie<'static> {
    let days = TokenService::session_days(extended) as i64;
    base_cookie(production, token, time::Duration::days(days))
}

/// Cookie that removes the session: same attributes, Max-Age=0.
/// Attributes must match creation or browsers keep the old cookie.
pub fn removal_cookie(production: bool) -> Cookie<'static> {
    base_cookie(production, String::new(), time::Duration::ZERO)
}

fn base_cookie(production: bool, value: String, max_age: time::Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(production);
    cookie.set_same_site(if production {
        SameSite::None
    } else {
        SameSite::Lax
    });
    cookie.set_max_age(max_age);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_dev_attributes() {
        let cookie = session_cookie(false, "tok".to_string(), false);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("cloudnotes_token=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(!rendered.contains("Secure"));
        assert!(rendered.contains(&format!("Max-Age={}", 7 * 24 * 60 * 60)));
    }

    #[test]
    fn test_session_cookie_production_attributes() {
        let cookie = session_cookie(true, "tok".to_string(), true);
        let rendered = cookie.to_string();

        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=None"));
        assert!(rendered.contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));
    }

    #[test]
    fn test_removal_cookie_mirrors_attributes() {
        let rendered = removal_cookie(true).to_string();

        assert!(rendered.starts_with("cloudnotes_token="));
        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=None"));
        assert!(rendered.contains("Path=/"));
    }
}
