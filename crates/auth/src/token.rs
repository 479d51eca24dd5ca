//! HS256 token signing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{validate_claims, JwtClaims, TokenValidationError};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed or unsigned token: {0}")]
    Decode(String),

    #[error("failed to sign token: {0}")]
    Encode(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies bearer tokens and yields their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Issues signed tokens for authenticated users.
pub trait JwtIssuer: Send + Sync {
    fn issue(&self, claims: &JwtClaims) -> Result<String, TokenError>;

    fn ttl(&self) -> Duration;
}

/// Shared-secret HS256 signer/validator.
///
/// Expiry is carried in our own `issued_at`/`expires_at` claims (RFC 3339) and
/// checked by `validate_claims`, so the registered `exp` claim is not required.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &Self::validation())
            .map_err(|e| TokenError::Decode(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl JwtIssuer for Hs256Jwt {
    fn issue(&self, claims: &JwtClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use tillpoint_core::{StoreId, UserId};

    fn claims_at(issued_at: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            store_id: StoreId::new(),
            stores: vec![],
            role: Role::admin(),
            issued_at,
            expires_at: issued_at + Duration::minutes(10),
        }
    }

    #[test]
    fn issued_token_validates_with_same_secret() {
        let jwt = Hs256Jwt::new(b"secret", Duration::minutes(10));
        let now = Utc::now();
        let claims = claims_at(now);
        let token = jwt.issue(&claims).unwrap();
        let decoded = jwt.validate(&token, now).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let signer = Hs256Jwt::new(b"one", Duration::minutes(10));
        let verifier = Hs256Jwt::new(b"two", Duration::minutes(10));
        let now = Utc::now();
        let token = signer.issue(&claims_at(now)).unwrap();
        assert!(matches!(verifier.validate(&token, now), Err(TokenError::Decode(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = Hs256Jwt::new(b"secret", Duration::minutes(10));
        let issued = Utc::now() - Duration::hours(1);
        let token = jwt.issue(&claims_at(issued)).unwrap();
        assert!(matches!(
            jwt.validate(&token, Utc::now()),
            Err(TokenError::Claims(TokenValidationError::Expired))
        ));
    }
}
