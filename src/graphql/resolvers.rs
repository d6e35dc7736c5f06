use async_graphql::{Context, ErrorExtensions, Object, Result};

use crate::auth::VerifiedIdentity;
use crate::database::{BookStore, StoreError};
use crate::error::ApiError;
use crate::graphql::types::{Book, CreateBookInput, UpdateBookInput};

#[derive(Default)]
pub struct QueryRoot;

#[derive(Default)]
pub struct MutationRoot;

fn store<'a>(ctx: &Context<'a>) -> Result<&'a BookStore> {
    ctx.data::<BookStore>()
}

fn store_error(err: StoreError) -> async_graphql::Error {
    ApiError::from(err).extend()
}

fn to_book(record: crate::database::BookRecord) -> Result<Book> {
    Book::try_from(record).map_err(|e| e.extend())
}

fn log_caller(ctx: &Context<'_>, operation: &str) {
    if let Some(identity) = ctx.data_opt::<VerifiedIdentity>() {
        tracing::debug!("{} requested by {:?}", operation, identity.subject);
    }
}

#[Object]
impl QueryRoot {
    /// All books, ordered by id
    async fn books(&self, ctx: &Context<'_>) -> Result<Vec<Book>> {
        log_caller(ctx, "books");
        store(ctx)?
            .list()
            .await
            .map_err(store_error)?
            .into_iter()
            .map(to_book)
            .collect()
    }

    async fn book(&self, ctx: &Context<'_>, id: i32) -> Result<Book> {
        log_caller(ctx, "book");
        let record = store(ctx)?.get(i64::from(id)).await.map_err(store_error)?;
        to_book(record)
    }
}

#[Object]
impl MutationRoot {
    async fn create_book(&self, ctx: &Context<'_>, create_book_input: CreateBookInput) -> Result<Book> {
        log_caller(ctx, "createBook");
        let record = store(ctx)?
            .create(&create_book_input.name, &create_book_input.description)
            .await
            .map_err(store_error)?;
        to_book(record)
    }

    async fn update_book(&self, ctx: &Context<'_>, update_book_input: UpdateBookInput) -> Result<Book> {
        log_caller(ctx, "updateBook");
        let UpdateBookInput { id, name, description } = update_book_input;
        let record = store(ctx)?
            .update(i64::from(id), &name, &description)
            .await
            .map_err(store_error)?;
        to_book(record)
    }

    /// `true` if the book existed and was deleted
    async fn remove_book(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        log_caller(ctx, "removeBook");
        store(ctx)?.remove(i64::from(id)).await.map_err(store_error)
    }
}
