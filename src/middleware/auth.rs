use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::error::ApiError;

/// Bearer token middleware placed in front of every data-bearing route.
///
/// Requests that fail verification are answered with 401 here and never
/// reach a handler. Accepted requests carry the `VerifiedIdentity` as an
/// extension.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let identity = state
        .verifier
        .verify_header(authorization.as_deref())
        .await?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
