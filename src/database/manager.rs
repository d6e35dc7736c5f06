use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Errors from the book store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Book with ID {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const CREATE_BOOKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL
    )
"#;

/// Connection pool setup for the catalog database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool and make sure the `books` table exists.
    ///
    /// In-memory databases live only as long as their connection, so the
    /// pool never retires idle connections.
    pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to an in-memory URL opens its own empty database
        let max_connections = if is_in_memory(url) {
            1
        } else {
            max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::ensure_schema(&pool).await?;
        info!("Connected to database {}", redact(url));
        Ok(pool)
    }

    pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(CREATE_BOOKS_TABLE).execute(pool).await?;
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Drop query parameters before logging a connection string
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
