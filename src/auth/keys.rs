//! Signing key resolution for access token verification.
//!
//! Keys are looked up by the `kid` in the token header. A miss fetches the
//! identity provider's published key set, extracts the matching entry and
//! keeps it for the configured TTL. Two requests that miss at the same time
//! may both fetch; the fetch is idempotent so nothing coordinates them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::DecodingKey;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Errors from resolving a key-id to public key material
#[derive(Debug, Error)]
pub enum KeyResolutionError {
    #[error("Failed to fetch key set: {0}")]
    Fetch(String),

    #[error("Key set endpoint returned status {0}")]
    HttpStatus(u16),

    #[error("Failed to parse key set: {0}")]
    Parse(String),

    #[error("Signing key not found: {0}")]
    KeyNotFound(String),

    #[error("Unsupported signing key {kid}: {reason}")]
    UnsupportedKey { kid: String, reason: String },
}

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of the provider's published key set
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeyResolutionError>;
}

/// Fetches the key set over HTTP(S) from a well-known endpoint.
///
/// No request timeout is configured; a hung provider blocks the verifying
/// request until the client disconnects.
pub struct HttpKeySetFetcher {
    client: reqwest::Client,
    jwks_uri: Url,
}

impl HttpKeySetFetcher {
    pub fn new(jwks_uri: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            jwks_uri,
        }
    }

    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self) -> Result<JwkSet, KeyResolutionError> {
        tracing::debug!("Fetching key set from {}", self.jwks_uri);

        let response = self
            .client
            .get(self.jwks_uri.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| KeyResolutionError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyResolutionError::HttpStatus(response.status().as_u16()));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| KeyResolutionError::Parse(e.to_string()))
    }
}

struct CachedKey {
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

/// Process-wide map of key-id to decoding key with a bounded lifetime.
///
/// Built once at startup and shared by handle with the verifier.
pub struct SigningKeyCache {
    fetcher: Arc<dyn KeySetFetcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedKey>>,
}

impl SigningKeyCache {
    pub fn new(fetcher: Arc<dyn KeySetFetcher>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            fetcher,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `kid` to a decoding key, fetching the key set on miss or expiry.
    pub async fn get(&self, kid: &str) -> Result<DecodingKey, KeyResolutionError> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(kid) {
                if now < cached.expires_at {
                    tracing::trace!("Signing key cache hit for kid {}", kid);
                    return Ok(cached.key.clone());
                }
            }
        }

        tracing::debug!("Signing key cache miss for kid {}", kid);
        let key_set = self.fetcher.fetch().await?;

        let jwk = key_set
            .find(kid)
            .ok_or_else(|| KeyResolutionError::KeyNotFound(kid.to_string()))?;

        let key = DecodingKey::from_jwk(jwk).map_err(|e| KeyResolutionError::UnsupportedKey {
            kid: kid.to_string(),
            reason: e.to_string(),
        })?;

        // Saturate instead of overflowing for very long lifetimes
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.write().await.insert(
            kid.to_string(),
            CachedKey {
                key: key.clone(),
                expires_at,
            },
        );

        Ok(key)
    }

    /// Number of cached entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
