//! Test helpers: RSA signing keys, token minting, a manual clock and a
//! counting key set fetcher.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::LineEnding;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::auth::{Clock, KeyResolutionError, KeySetFetcher};
use crate::config::AuthSettings;

pub const TEST_DOMAIN: &str = "bookshelf-test.us.auth0.com";
pub const TEST_ISSUER: &str = "https://bookshelf-test.us.auth0.com/";
pub const TEST_AUDIENCE: &str = "https://api.bookshelf.test";

pub fn test_auth_settings() -> AuthSettings {
    AuthSettings {
        domain: TEST_DOMAIN.to_string(),
        audience: TEST_AUDIENCE.to_string(),
        key_cache_ttl_secs: 24 * 60 * 60,
    }
}

/// RSA key pair with its public half published as a JWK
pub struct TestKey {
    pub kid: String,
    encoding: EncodingKey,
    n: String,
    e: String,
}

impl TestKey {
    fn generate(kid: &str) -> Self {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("rsa keygen");
        let pem = private.to_pkcs1_pem(LineEnding::LF).expect("pem export");
        let encoding = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("encoding key");

        Self {
            kid: kid.to_string(),
            encoding,
            n: URL_SAFE_NO_PAD.encode(private.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(private.e().to_bytes_be()),
        }
    }

    pub fn jwk(&self) -> Jwk {
        serde_json::from_value(json!({
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": self.kid,
            "n": self.n,
            "e": self.e,
        }))
        .expect("valid jwk")
    }
}

/// Key generation is slow in debug builds, so each key is made once per test binary
pub fn rsa_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(|| TestKey::generate("test-key-1"))
}

pub fn secondary_rsa_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(|| TestKey::generate("test-key-2"))
}

/// Builds access tokens that pass verification unless told otherwise
pub struct TokenBuilder {
    claims: Value,
    kid: Option<String>,
    omit_kid: bool,
}

impl TokenBuilder {
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        Self {
            claims: json!({
                "sub": "auth0|test-user",
                "aud": TEST_AUDIENCE,
                "iss": TEST_ISSUER,
                "iat": now,
                "exp": now + 3600,
            }),
            kid: None,
            omit_kid: false,
        }
    }

    pub fn subject(mut self, sub: &str) -> Self {
        self.claims["sub"] = json!(sub);
        self
    }

    pub fn audience(mut self, aud: &str) -> Self {
        self.claims["aud"] = json!(aud);
        self
    }

    pub fn audiences(mut self, aud: &[&str]) -> Self {
        self.claims["aud"] = json!(aud);
        self
    }

    pub fn issuer(mut self, iss: &str) -> Self {
        self.claims["iss"] = json!(iss);
        self
    }

    /// Seconds from now; negative for an already expired token
    pub fn expires_in(mut self, secs: i64) -> Self {
        self.claims["exp"] = json!(Utc::now().timestamp() + secs);
        self
    }

    pub fn kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    pub fn without_kid(mut self) -> Self {
        self.omit_kid = true;
        self
    }

    pub fn sign(self, key: &TestKey) -> String {
        let mut header = Header::new(Algorithm::RS256);
        if !self.omit_kid {
            header.kid = Some(self.kid.unwrap_or_else(|| key.kid.clone()));
        }
        encode(&header, &self.claims, &key.encoding).expect("token signing")
    }
}

/// Otherwise valid token signed with a shared secret instead of the provider key
pub fn hs256_token(kid: &str) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    let claims = TokenBuilder::new().claims;
    encode(&header, &claims, &EncodingKey::from_secret(b"not-the-provider-key")).expect("hs256 signing")
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Serves a fixed key set and counts how often it was asked
pub struct StaticKeySetFetcher {
    key_set: JwkSet,
    calls: AtomicUsize,
}

impl StaticKeySetFetcher {
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self {
            key_set: JwkSet { keys },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetFetcher for StaticKeySetFetcher {
    async fn fetch(&self) -> Result<JwkSet, KeyResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.key_set.clone())
    }
}

/// Single-connection in-memory database with the books table in place
pub async fn memory_pool() -> SqlitePool {
    crate::database::DatabaseManager::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite")
}
