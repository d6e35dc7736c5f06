//! GraphQL schema for the book catalog.
//!
//! The schema itself performs no authentication; the HTTP layer only hands
//! requests to it after the token verifier has accepted them.

pub mod resolvers;
pub mod types;

use async_graphql::{EmptySubscription, Schema};

use crate::database::BookStore;
pub use resolvers::{MutationRoot, QueryRoot};
pub use types::{Book, CreateBookInput, UpdateBookInput};

pub type BookSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(store: BookStore) -> BookSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(store)
        .finish()
}
