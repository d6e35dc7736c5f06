use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while assembling configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Single origin allowed by CORS (the browser client)
    pub frontend_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Identity provider policy used by the token verifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Identity provider domain, e.g. `example.us.auth0.com`
    pub domain: String,
    /// Expected `aud` claim (the API identifier)
    pub audience: String,
    pub key_cache_ttl_secs: u64,
}

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://database.sqlite?mode=rwc";
/// Signing keys are trusted for 24 hours before the key set is fetched again
pub const DEFAULT_KEY_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
/// Upper bound for `KEY_CACHE_TTL_SECS` (30 days)
pub const MAX_KEY_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// Fails when the identity provider domain or audience is absent so the
    /// server never starts with an incomplete authentication policy.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Same as [`AppConfig::from_env`] but over an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = match get("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let domain = get("AUTH0_DOMAIN").ok_or(ConfigError::Missing("AUTH0_DOMAIN"))?;
        let audience = get("AUTH0_AUDIENCE").ok_or(ConfigError::Missing("AUTH0_AUDIENCE"))?;

        let mut config = Self::defaults(environment, domain, audience);

        if let Some(v) = get("PORT") {
            config.server.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = get("FRONTEND_URL") {
            config.server.frontend_url = v;
        }
        if let Some(v) = get("DATABASE_URL") {
            config.database.url = v;
        }
        if let Some(v) = get("DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = get("KEY_CACHE_TTL_SECS") {
            let ttl: u64 = parse_var("KEY_CACHE_TTL_SECS", &v)?;
            if ttl == 0 || ttl > MAX_KEY_CACHE_TTL_SECS {
                return Err(ConfigError::Invalid {
                    name: "KEY_CACHE_TTL_SECS",
                    value: v,
                });
            }
            config.auth.key_cache_ttl_secs = ttl;
        }

        Ok(config)
    }

    fn defaults(environment: Environment, domain: String, audience: String) -> Self {
        let max_connections = match environment {
            Environment::Production => 10,
            Environment::Staging | Environment::Development => 5,
        };

        Self {
            environment,
            server: ServerConfig {
                port: DEFAULT_PORT,
                frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections,
            },
            auth: AuthSettings {
                domain,
                audience,
                key_cache_ttl_secs: DEFAULT_KEY_CACHE_TTL_SECS,
            },
        }
    }
}

impl AuthSettings {
    /// Issuer as the provider writes it into `iss`: `https://<domain>/`
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain.trim_end_matches('/'))
    }

    pub fn jwks_uri(&self) -> String {
        format!("{}.well-known/jwks.json", self.issuer())
    }

    /// Key cache lifetime, refused when zero or beyond `MAX_KEY_CACHE_TTL_SECS`
    pub fn key_cache_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        let invalid = || ConfigError::Invalid {
            name: "KEY_CACHE_TTL_SECS",
            value: self.key_cache_ttl_secs.to_string(),
        };

        if self.key_cache_ttl_secs == 0 || self.key_cache_ttl_secs > MAX_KEY_CACHE_TTL_SECS {
            return Err(invalid());
        }
        let secs = i64::try_from(self.key_cache_ttl_secs).map_err(|_| invalid())?;
        chrono::Duration::try_seconds(secs).ok_or_else(invalid)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
