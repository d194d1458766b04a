use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // email
    exp: usize,
}

/// Why a token failed validation. Callers log the variant but always
/// answer the client with the same generic 401.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    InvalidSignature,
    Expired,
    Malformed,
}

/// HS256 signing and verification keys derived from the process-wide
/// secret. Built once at startup, cloned into each request's state.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a bearer token for the given subject, expiring in 30 minutes.
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        let exp = (Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp() as usize;
        let claims = Claims {
            sub: subject.to_string(),
            exp,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verifies signature and expiry, returning the subject.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            })
    }
}
