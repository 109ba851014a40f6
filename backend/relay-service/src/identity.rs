//! Identity verification for incoming connections
//!
//! The relay does not own accounts. It only needs `credential -> UserId`, so the
//! check sits behind [`IdentityVerifier`]. [`JwtIdentityVerifier`] accepts the
//! session tokens issued by the web backend (HS256 `userId` claim) or RS256
//! tokens carrying the user in `sub`.

use async_trait::async_trait;
use event_schema::UserId;
use jsonwebtoken::{
    decode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, Validation,
};
use serde::Deserialize;
use std::collections::HashSet;

use crate::config::Config;
use crate::error::{AppError, IdentityError};

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve an opaque credential to the account it belongs to
    async fn verify_identity(&self, credential: &str) -> Result<UserId, IdentityError>;
}

/// Token claims; the web backend signs `userId`, other issuers use `sub`
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    jti: Option<String>,
}

pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    revoked: HashSet<String>,
}

impl JwtIdentityVerifier {
    pub fn hs256(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            revoked: HashSet::new(),
        }
    }

    pub fn rs256_pem(public_key_pem: &str) -> Result<Self, AppError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| AppError::Config(format!("invalid RS256 public key: {e}")))?;
        Ok(Self {
            decoding_key,
            validation: Validation::new(Algorithm::RS256),
            revoked: HashSet::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let verifier = match (&config.jwt_public_key_pem, &config.jwt_secret) {
            (Some(pem), _) if !pem.trim().is_empty() => Self::rs256_pem(pem)?,
            (_, Some(secret)) if !secret.trim().is_empty() => Self::hs256(secret),
            _ => {
                return Err(AppError::Config(
                    "no JWT verification key configured".into(),
                ))
            }
        };
        Ok(verifier.with_revoked(config.revoked_token_ids.iter().cloned()))
    }

    pub fn with_revoked(mut self, token_ids: impl IntoIterator<Item = String>) -> Self {
        self.revoked.extend(token_ids.into_iter().filter(|id| !id.is_empty()));
        self
    }

    fn check(&self, credential: &str) -> Result<UserId, IdentityError> {
        if credential.trim().is_empty() {
            return Err(IdentityError::Missing);
        }

        let data = decode::<Claims>(credential, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;
        let claims = data.claims;

        if let Some(jti) = &claims.jti {
            if self.revoked.contains(jti) {
                return Err(IdentityError::Revoked);
            }
        }

        let user_id = claims
            .user_id
            .or(claims.sub)
            .map(UserId::new)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| IdentityError::Invalid("token carries no user id".into()))?;

        Ok(user_id)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> IdentityError {
    match err.kind() {
        JwtErrorKind::ExpiredSignature => IdentityError::Expired,
        JwtErrorKind::InvalidToken
        | JwtErrorKind::Base64(_)
        | JwtErrorKind::Json(_)
        | JwtErrorKind::Utf8(_) => IdentityError::Malformed,
        other => IdentityError::Invalid(format!("{other:?}")),
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify_identity(&self, credential: &str) -> Result<UserId, IdentityError> {
        self.check(credential)
    }
}
