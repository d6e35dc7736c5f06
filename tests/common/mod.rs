#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::LineEnding;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use url::Url;

use bookshelf_api::api::{cors_layer, router, AppState};
use bookshelf_api::auth::{HttpKeySetFetcher, SigningKeyCache, SystemClock, TokenVerifier};
use bookshelf_api::config::AuthSettings;
use bookshelf_api::database::DatabaseManager;

pub const DOMAIN: &str = "bookshelf-it.us.auth0.com";
pub const ISSUER: &str = "https://bookshelf-it.us.auth0.com/";
pub const AUDIENCE: &str = "https://api.bookshelf.it";
pub const FRONTEND: &str = "http://localhost:5173";
pub const KID: &str = "it-key-1";

struct SigningKey {
    encoding: EncodingKey,
    jwk: Value,
}

fn signing_key() -> &'static SigningKey {
    static KEY: OnceLock<SigningKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("rsa keygen");
        let pem = private.to_pkcs1_pem(LineEnding::LF).expect("pem export");
        SigningKey {
            encoding: EncodingKey::from_rsa_pem(pem.as_bytes()).expect("encoding key"),
            jwk: json!({
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": KID,
                "n": URL_SAFE_NO_PAD.encode(private.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(private.e().to_bytes_be()),
            }),
        }
    })
}

/// Access token for the test provider; `overrides` replaces individual claims
pub fn token_with(overrides: Value) -> String {
    let now = Utc::now().timestamp();
    let mut claims = json!({
        "sub": "auth0|integration",
        "aud": AUDIENCE,
        "iss": ISSUER,
        "iat": now,
        "exp": now + 3600,
    });
    if let (Some(target), Value::Object(extra)) = (claims.as_object_mut(), overrides) {
        target.extend(extra);
    }

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    encode(&header, &claims, &signing_key().encoding).expect("token signing")
}

pub fn token() -> String {
    token_with(json!({}))
}

/// Identity provider stand-in that serves the key set and counts fetches
pub struct MockProvider {
    pub jwks_uri: Url,
    fetches: Arc<AtomicUsize>,
}

impl MockProvider {
    pub async fn start() -> Result<Self> {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let key_set = json!({ "keys": [signing_key().jwk.clone()] });

        let app = Router::new().route(
            "/.well-known/jwks.json",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let key_set = key_set.clone();
                async move { Json(key_set) }
            }),
        );
        let addr = serve(app).await?;

        Ok(Self {
            jwks_uri: Url::parse(&format!("http://{}/.well-known/jwks.json", addr))?,
            fetches,
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

pub struct TestServer {
    pub base_url: String,
    pub provider: MockProvider,
}

impl TestServer {
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url)
    }
}

async fn serve(app: Router) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

/// Full API on an ephemeral port over an in-memory database, verifying
/// tokens against a local key set endpoint.
pub async fn start_server() -> Result<TestServer> {
    let provider = MockProvider::start().await?;

    let settings = AuthSettings {
        domain: DOMAIN.to_string(),
        audience: AUDIENCE.to_string(),
        key_cache_ttl_secs: 24 * 60 * 60,
    };
    let keys = SigningKeyCache::new(
        Arc::new(HttpKeySetFetcher::new(provider.jwks_uri.clone())),
        Arc::new(SystemClock),
        settings.key_cache_ttl()?,
    );
    let verifier = TokenVerifier::new(&settings, keys)?;
    let pool = DatabaseManager::connect("sqlite::memory:", 1)
        .await
        .context("in-memory sqlite")?;

    let app = router(AppState::new(pool, verifier), cors_layer(FRONTEND)?);
    let addr = serve(app).await?;

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        provider,
    })
}

/// POST a GraphQL document, optionally with a bearer token
pub async fn graphql(
    server: &TestServer,
    token: Option<&str>,
    query: &str,
    variables: Value,
) -> Result<reqwest::Response> {
    let client = reqwest::Client::new();
    let mut request = client
        .post(server.graphql_url())
        .json(&json!({ "query": query, "variables": variables }));
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }
    Ok(request.send().await?)
}
