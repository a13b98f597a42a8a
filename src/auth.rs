// ABOUTME: Authentication manager - bcrypt password hashing and JWT issuance/validation
// ABOUTME: Stateless HS256 tokens carrying the user id, validated on every protected request
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::User;

/// JWT claims carried by every access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (standard subject claim)
    pub sub: String,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

/// Why a token failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token has passed its expiry
    Expired,
    /// Signature, structure, or claim content is invalid
    Invalid,
}

/// Issues and validates access tokens, hashes and verifies passwords
#[derive(Clone)]
pub struct AuthManager {
    jwt_secret: Vec<u8>,
    expiry_hours: i64,
}

impl AuthManager {
    /// Create an auth manager with the given signing secret and token
    /// lifetime in hours
    #[must_use]
    pub fn new(jwt_secret: &str, expiry_hours: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.as_bytes().to_vec(),
            expiry_hours,
        }
    }

    /// Hash a password for storage
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing fails.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a password against its stored hash
    ///
    /// # Errors
    ///
    /// Returns an internal error if the stored hash is malformed.
    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        bcrypt::verify(password, hash)
            .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))
    }

    /// Issue a signed access token for a user
    ///
    /// # Errors
    ///
    /// Returns an internal error if signing fails.
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.jwt_secret),
        )
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))
    }

    /// Validate a token and return the user id it was issued for
    ///
    /// # Errors
    ///
    /// Distinguishes expiry from every other failure so callers can
    /// surface an accurate message.
    pub fn validate_token(&self, token: &str) -> Result<Uuid, JwtValidationError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.jwt_secret),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtValidationError::Expired,
            _ => JwtValidationError::Invalid,
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| JwtValidationError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserPreferences;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            preferences: UserPreferences::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_round_trip() {
        let auth = AuthManager::new("test-secret", 1);
        let hash = auth.hash_password("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(auth.verify_password("hunter22", &hash).unwrap());
        assert!(!auth.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn token_round_trip() {
        let auth = AuthManager::new("test-secret", 1);
        let user = test_user();
        let token = auth.generate_token(&user).unwrap();
        let subject = auth.validate_token(&token).unwrap();
        assert_eq!(subject, user.id);
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let auth = AuthManager::new("test-secret", 1);
        let other = AuthManager::new("other-secret", 1);
        let token = auth.generate_token(&test_user()).unwrap();
        assert_eq!(
            other.validate_token(&token),
            Err(JwtValidationError::Invalid)
        );
    }

    #[test]
    fn token_rejects_garbage() {
        let auth = AuthManager::new("test-secret", 1);
        assert_eq!(
            auth.validate_token("not.a.token"),
            Err(JwtValidationError::Invalid)
        );
    }
}
