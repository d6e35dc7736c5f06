use axum::{
    extract::{Extension, State},
    response::Json,
};

use crate::api::AppState;
use crate::auth::VerifiedIdentity;

/// POST /graphql - runs behind `require_bearer`, so the identity is always present
pub async fn graphql(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    tracing::debug!(
        "GraphQL request {:?} from {:?}",
        request.operation_name,
        identity.subject
    );

    Json(state.schema.execute(request.data(identity)).await)
}
