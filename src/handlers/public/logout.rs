// handlers/public/logout.rs - DELETE /api/logout

use axum::{extract::State, http::HeaderMap};
use serde_json::{json, Value};

use crate::database::{models::Session, Repository};
use crate::middleware::{authenticate, ApiResponse, ApiResult};
use crate::state::AppState;

/// Close the caller's session when the request carries valid credentials.
/// Succeeds either way.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    match authenticate(&state, &headers).await {
        Ok(credentials) => {
            Repository::<Session>::new(&state.pool)
                .delete_many(json!({ "_id": credentials.session.id }))
                .await?;
            tracing::debug!("Closed session {}", credentials.session.id);
        }
        Err(e) => tracing::debug!("Logout without a valid session: {}", e),
    }
    Ok(ApiResponse::message("Success."))
}
