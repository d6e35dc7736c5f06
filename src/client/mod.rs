//! Typed client for the book catalog GraphQL endpoint.
//!
//! Sends the same operations the browser frontend sends, with the stored
//! access token attached as a bearer credential.

use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/graphql";

const GET_BOOKS: &str = "query GetBooks {
  books {
    id
    name
    description
  }
}";

const GET_BOOK: &str = "query GetBook($id: Int!) {
  book(id: $id) {
    id
    name
    description
  }
}";

const CREATE_BOOK: &str = "mutation CreateBook($createBookInput: CreateBookInput!) {
  createBook(createBookInput: $createBookInput) {
    id
    name
    description
  }
}";

const UPDATE_BOOK: &str = "mutation UpdateBook($updateBookInput: UpdateBookInput!) {
  updateBook(updateBookInput: $updateBookInput) {
    id
    name
    description
  }
}";

const REMOVE_BOOK: &str = "mutation RemoveBook($id: Int!) {
  removeBook(id: $id)
}";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{message}")]
    GraphQl {
        message: String,
        code: Option<String>,
    },

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// GraphQL error code reported by the server, when there is one
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::GraphQl { code, .. } => code.as_deref(),
            ClientError::Unauthorized(_) => Some("UNAUTHORIZED"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

pub struct BookClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl BookClient {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        self.execute(GET_BOOKS, json!({}), "books").await
    }

    pub async fn get_book(&self, id: i32) -> Result<Book, ClientError> {
        self.execute(GET_BOOK, json!({ "id": id }), "book").await
    }

    pub async fn create_book(&self, name: &str, description: &str) -> Result<Book, ClientError> {
        let variables = json!({
            "createBookInput": { "name": name, "description": description }
        });
        self.execute(CREATE_BOOK, variables, "createBook").await
    }

    pub async fn update_book(
        &self,
        id: i32,
        name: &str,
        description: &str,
    ) -> Result<Book, ClientError> {
        let variables = json!({
            "updateBookInput": { "id": id, "name": name, "description": description }
        });
        self.execute(UPDATE_BOOK, variables, "updateBook").await
    }

    pub async fn remove_book(&self, id: i32) -> Result<bool, ClientError> {
        self.execute(REMOVE_BOOK, json!({ "id": id }), "removeBook").await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<T, ClientError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }));

        match &self.token {
            Some(token) => {
                request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            None => tracing::warn!("No access token stored; the server will reject this request"),
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unauthorized")
                .to_string();
            return Err(ClientError::Unauthorized(message));
        }
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let body: GraphQlResponse = response.json().await?;
        if let Some(first) = body.errors.into_iter().next() {
            let code = first
                .extensions
                .as_ref()
                .and_then(|ext| ext.get("code"))
                .and_then(Value::as_str)
                .map(str::to_string);
            return Err(ClientError::GraphQl {
                message: first.message,
                code,
            });
        }

        let value = body
            .data
            .and_then(|mut data| data.get_mut(field).map(Value::take))
            .ok_or_else(|| ClientError::Malformed(format!("missing field '{}'", field)))?;

        serde_json::from_value(value).map_err(|e| ClientError::Malformed(e.to_string()))
    }
}
