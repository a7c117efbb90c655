//! JWT implementation of the [`TokenVerifier`] port.
//!
//! Tokens are HS256-signed with a shared secret, carrying the user identity
//! in the standard `sub` claim. Verification is CPU-bound; the async port
//! shape exists for verifiers that call out to an identity provider.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::{AccessClaims, TokenError, TokenVerifier};

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    /// Subject: the user the token was issued to.
    sub: Uuid,
    /// Expiry as a unix timestamp.
    exp: i64,
}

/// HS256 token verifier over a shared secret.
pub struct JwtTokenVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    /// Build a verifier from the shared signing secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|error| TokenError::rejected(error.to_string()))?;
        Ok(AccessClaims {
            user_id: UserId::new(data.claims.sub),
        })
    }
}

/// Mint a short-lived token for the given user.
///
/// The issuing side lives in the account service; this helper exists for
/// tests and local tooling that need a valid credential against the same
/// secret.
pub fn mint_token(
    secret: &[u8],
    user_id: &UserId,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = JwtClaims {
        sub: *user_id.as_uuid(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}
