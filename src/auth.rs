// ABOUTME: JWT authentication manager for validating bearer tokens on chat routes
// ABOUTME: HS256 tokens carry the user id in `sub` plus optional profile claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JWT authentication.
//!
//! There is no user table; identity is whatever the validated token claims.
//! Tokens are issued out-of-band (or via `generate_token` for tests and
//! tooling) and validated on every request.

use crate::errors::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier
    pub sub: String,
    /// Optional email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Optional display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

/// Identity established for a request after token validation
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User identifier from the token `sub` claim
    pub user_id: String,
    /// Email address, when the token carries one
    pub email: Option<String>,
    /// Display name, when the token carries one
    pub name: Option<String>,
}

/// Validates and issues HS256 access tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

impl AuthManager {
    /// Create a manager from the shared JWT secret
    #[must_use]
    pub fn new(jwt_secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_lifetime: Duration::hours(expiry_hours),
        }
    }

    /// Issue a token for the given user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if token signing fails.
    pub fn generate_token(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_owned(),
            email: email.map(str::to_owned),
            name: name.map(str::to_owned),
            iat: now.timestamp(),
            exp: (now + self.token_lifetime).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Validate a token and return the authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AuthInvalid` for expired, malformed, or
    /// wrongly-signed tokens.
    pub fn validate_token(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::auth_invalid(format!("Invalid token: {e}")))?;

        Ok(AuthenticatedUser {
            user_id: data.claims.sub,
            email: data.claims.email,
            name: data.claims.name,
        })
    }
}

/// Extract the bearer token from an `Authorization` header value.
///
/// # Errors
///
/// Returns `AppError::AuthRequired` when the header is not a bearer scheme.
pub fn extract_bearer_token(header_value: &str) -> AppResult<&str> {
    header_value
        .strip_prefix("Bearer ")
        .ok_or_else(AppError::auth_required)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn manager() -> AuthManager {
        AuthManager::new("test-secret-key", 24)
    }

    #[test]
    fn test_round_trip_token() {
        let auth = manager();
        let token = auth
            .generate_token("user-1", Some("u@example.com"), Some("Uma"))
            .unwrap();
        let user = auth.validate_token(&token).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.email.as_deref(), Some("u@example.com"));
        assert_eq!(user.name.as_deref(), Some("Uma"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = manager().generate_token("user-1", None, None).unwrap();
        let other = AuthManager::new("a-different-secret", 24);
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_bearer_token("Basic dXNlcjpwYXNz").is_err());
        assert!(extract_bearer_token("abc").is_err());
    }
}
