use sqlx::SqlitePool;

use crate::database::manager::StoreError;
use crate::database::models::BookRecord;

/// CRUD over the `books` table.
///
/// Every method is a single statement; nothing spans a transaction and
/// concurrent writers simply overwrite each other. Names and descriptions
/// are stored as given, empty strings included.
#[derive(Clone)]
pub struct BookStore {
    pool: SqlitePool,
}

impl BookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn list(&self) -> Result<Vec<BookRecord>, StoreError> {
        let books = sqlx::query_as::<_, BookRecord>(
            "SELECT id, name, description FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn get(&self, id: i64) -> Result<BookRecord, StoreError> {
        sqlx::query_as::<_, BookRecord>("SELECT id, name, description FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    pub async fn create(&self, name: &str, description: &str) -> Result<BookRecord, StoreError> {
        let book = sqlx::query_as::<_, BookRecord>(
            "INSERT INTO books (name, description) VALUES (?, ?) RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created book {}", book.id);
        Ok(book)
    }

    /// Overwrite both fields. A missing id is an error, never an insert.
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        description: &str,
    ) -> Result<BookRecord, StoreError> {
        sqlx::query_as::<_, BookRecord>(
            "UPDATE books SET name = ?, description = ? WHERE id = ? RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    /// `true` when a row was deleted, `false` when there was none
    pub async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
