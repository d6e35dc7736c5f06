use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use url::Url;

use crate::auth::{HttpKeySetFetcher, SigningKeyCache, SystemClock, TokenVerifier};
use crate::config::{AppConfig, ConfigError};
use crate::database::{BookStore, DatabaseManager};
use crate::graphql::{build_schema, BookSchema};
use crate::handlers::{protected, public};
use crate::middleware::require_bearer;

/// Shared state handed to every handler and to the auth middleware
#[derive(Clone)]
pub struct AppState {
    pub schema: BookSchema,
    pub verifier: Arc<TokenVerifier>,
    pub pool: SqlitePool,
}

impl AppState {
    pub fn new(pool: SqlitePool, verifier: TokenVerifier) -> Self {
        let schema = build_schema(BookStore::new(pool.clone()));
        Self {
            schema,
            verifier: Arc::new(verifier),
            pool,
        }
    }

    /// Open the database and wire the verifier against the live key set endpoint
    pub async fn initialize(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = DatabaseManager::connect(&config.database.url, config.database.max_connections)
            .await
            .context("failed to open book database")?;

        let jwks_uri = config.auth.jwks_uri();
        let jwks_uri = Url::parse(&jwks_uri).map_err(|_| ConfigError::Invalid {
            name: "AUTH0_DOMAIN",
            value: config.auth.domain.clone(),
        })?;
        tracing::info!("Signing keys will be fetched from {}", jwks_uri);

        let keys = SigningKeyCache::new(
            Arc::new(HttpKeySetFetcher::new(jwks_uri)),
            Arc::new(SystemClock),
            config.auth.key_cache_ttl()?,
        );
        let verifier = TokenVerifier::new(&config.auth, keys)?;

        Ok(Self::new(pool, verifier))
    }
}

/// Application router.
///
/// `POST /graphql` sits behind `require_bearer`; the landing page, health
/// probe and GraphiQL page stay public.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let graphql = get(public::graphiql).merge(
        post(protected::graphql)
            .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer)),
    );

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/graphql", graphql)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy that admits exactly one browser origin, with credentials
pub fn cors_layer(frontend_url: &str) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/')).map_err(|_| {
        ConfigError::Invalid {
            name: "FRONTEND_URL",
            value: frontend_url.to_string(),
        }
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}
