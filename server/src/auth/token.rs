use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;
use crate::utils::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub role: Role,
    pub venue_id: Option<Uuid>,
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
            ttl,
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        role: Role,
        venue_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: user_id,
            role,
            venue_id,
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("token signing failed: {e}")))?;
        Ok((token, expires_at))
    }

    /// Checks the signature and `exp`. Expiry is checked against both the
    /// wall clock and `now`, so callers can evaluate a token at a fixed instant.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AppError> {
        let invalid = || AppError::AuthError("Invalid or expired session token".to_string());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = decode::<SessionClaims>(token.trim(), &self.decoding, &validation)
            .map_err(|_| invalid())?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(invalid());
        }
        Ok(claims)
    }
}
