use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `books` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BookRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
}
