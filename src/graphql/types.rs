use async_graphql::{InputObject, SimpleObject};

use crate::database::BookRecord;
use crate::error::ApiError;

/// Book as exposed through the API
#[derive(Debug, Clone, PartialEq, Eq, SimpleObject)]
pub struct Book {
    pub id: i32,
    pub name: String,
    pub description: String,
}

impl TryFrom<BookRecord> for Book {
    type Error = ApiError;

    fn try_from(record: BookRecord) -> Result<Self, Self::Error> {
        let id = i32::try_from(record.id).map_err(|_| {
            tracing::error!("Book id {} does not fit a GraphQL Int", record.id);
            ApiError::internal_server_error("Book id out of range")
        })?;

        Ok(Self {
            id,
            name: record.name,
            description: record.description,
        })
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct CreateBookInput {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, InputObject)]
pub struct UpdateBookInput {
    pub id: i32,
    pub name: String,
    pub description: String,
}
