//! HS256 token issuance and validation.
//!
//! Claims carry RFC 3339 timestamps rather than the registered numeric `exp`
//! claim, so `jsonwebtoken` only checks the signature here and the time window
//! is enforced by [`validate_claims`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use aula_core::UserId;

use crate::{validate_claims, JwtClaims, Role, TokenValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("malformed or badly signed token: {0}")]
    Decode(String),

    #[error("failed to encode token: {0}")]
    Encode(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Token validation seam used by the HTTP middleware.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// Shared-secret (HS256) validator.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| JwtError::Decode(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

/// Shared-secret (HS256) issuer used by the login endpoint.
pub struct Hs256JwtIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl Hs256JwtIssuer {
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(&secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = JwtClaims {
            sub: user_id,
            role,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| JwtError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn issued_token_validates_with_same_secret() {
        let issuer = Hs256JwtIssuer::new(SECRET.to_vec(), Duration::minutes(10));
        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        let now = Utc::now();
        let user = UserId::new();

        let token = issuer.issue(user, Role::Teacher, now).unwrap();
        let claims = validator.validate(&token, now).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, Role::Teacher);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = Hs256JwtIssuer::new(SECRET.to_vec(), Duration::minutes(10));
        let validator = Hs256JwtValidator::new(b"other".to_vec());
        let now = Utc::now();
        let token = issuer.issue(UserId::new(), Role::Admin, now).unwrap();
        assert!(matches!(validator.validate(&token, now), Err(JwtError::Decode(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = Hs256JwtIssuer::new(SECRET.to_vec(), Duration::minutes(10));
        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        let now = Utc::now();
        let token = issuer.issue(UserId::new(), Role::Student, now).unwrap();
        assert_eq!(
            validator.validate(&token, now + Duration::minutes(11)),
            Err(JwtError::Claims(TokenValidationError::Expired))
        );
    }
}
