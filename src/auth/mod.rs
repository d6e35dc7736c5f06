//! Bearer token verification against the identity provider's published keys.
//!
//! A request moves through `Unverified → HeaderExtracted → KeyResolved →
//! SignatureChecked` and ends either authorized or rejected. Nothing is
//! retried; a rejected caller must come back with a fresh token.

pub mod keys;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AuthSettings, ConfigError};
pub use keys::{
    Clock, HttpKeySetFetcher, KeyResolutionError, KeySetFetcher, SigningKeyCache, SystemClock,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Reasons a request is not authenticated
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No authorization token provided")]
    MissingToken,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Invalid or expired token: signing key could not be resolved")]
    KeyResolution(#[from] KeyResolutionError),

    #[error("Invalid or expired token: {0}")]
    Rejected(String),
}

/// `aud` may be a single string or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    #[serde(default)]
    sub: Option<String>,
    aud: Audience,
    iss: String,
    exp: i64,
}

/// Claims of a token that passed verification. Lives for one request only.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject: Option<String>,
    pub audience: Audience,
    pub issuer: String,
    pub expires_at: DateTime<Utc>,
    pub key_id: String,
}

/// Decides whether a bearer token is valid, unexpired and scoped to this API
pub struct TokenVerifier {
    audience: String,
    issuer: String,
    keys: SigningKeyCache,
}

impl TokenVerifier {
    /// Build a verifier for the configured provider. Empty domain or audience
    /// is refused so no request is ever checked against a partial policy.
    pub fn new(settings: &AuthSettings, keys: SigningKeyCache) -> Result<Self, ConfigError> {
        if settings.domain.trim().is_empty() {
            return Err(ConfigError::Missing("AUTH0_DOMAIN"));
        }
        if settings.audience.trim().is_empty() {
            return Err(ConfigError::Missing("AUTH0_AUDIENCE"));
        }

        Ok(Self {
            audience: settings.audience.clone(),
            issuer: settings.issuer(),
            keys,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Verify the raw `Authorization` header value of one request
    pub async fn verify_header(
        &self,
        authorization: Option<&str>,
    ) -> Result<VerifiedIdentity, AuthError> {
        let token = extract_bearer(authorization)?;
        self.verify_token(token).await
    }

    pub async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::warn!("Token verification failed: undecodable header: {}", e);
            AuthError::InvalidTokenFormat
        })?;

        let kid = header.kid.ok_or_else(|| {
            tracing::warn!("Token verification failed: header has no kid");
            AuthError::InvalidTokenFormat
        })?;

        let key = self.keys.get(&kid).await.map_err(|e| {
            tracing::warn!("Token verification failed: kid {}: {}", kid, e);
            AuthError::from(e)
        })?;

        let data = decode::<AccessTokenClaims>(token, &key, &self.validation()).map_err(|e| {
            let reason = describe_rejection(e.kind());
            tracing::warn!("Token verification failed: kid {}: {} ({})", kid, reason, e);
            AuthError::Rejected(reason)
        })?;

        let claims = data.claims;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AuthError::Rejected("jwt expiry out of range".to_string()))?;

        tracing::debug!("Token verified for subject {:?} (kid {})", claims.sub, kid);

        Ok(VerifiedIdentity {
            subject: claims.sub,
            audience: claims.aud,
            issuer: claims.iss,
            expires_at,
            key_id: kid,
        })
    }

    /// RS256 only, no clock leeway, exact audience and issuer
    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation
    }
}

/// Pull the token out of `Bearer <token>`. The prefix is matched literally.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    authorization
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::MissingToken)
}

fn describe_rejection(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::ExpiredSignature => "jwt expired".to_string(),
        ErrorKind::InvalidSignature => "invalid signature".to_string(),
        ErrorKind::InvalidAudience => "jwt audience invalid".to_string(),
        ErrorKind::InvalidIssuer => "jwt issuer invalid".to_string(),
        ErrorKind::InvalidAlgorithm => "invalid algorithm".to_string(),
        ErrorKind::ImmatureSignature => "jwt not active".to_string(),
        ErrorKind::MissingRequiredClaim(claim) => format!("jwt {} claim missing", claim),
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            "jwt malformed".to_string()
        }
        _ => "token verification failed".to_string(),
    }
}
