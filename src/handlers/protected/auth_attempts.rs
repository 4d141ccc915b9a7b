// handlers/protected/auth_attempts.rs - /api/auth-attempts

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};

use crate::database::models::AuthAttempt;
use crate::database::{PageQuery, Paged, Repository};
use crate::middleware::{ApiResponse, ApiResult, AuthCredentials};
use crate::state::AppState;

pub async fn auth_attempts_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paged<Value>> {
    auth.ensure_root_admin()?;
    let paged = Repository::<AuthAttempt>::new(&state.pool).paged_find(json!({}), &query).await?;
    Ok(ApiResponse::success(paged))
}

pub async fn auth_attempt_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<AuthAttempt> {
    auth.ensure_root_admin()?;
    let attempt = Repository::<AuthAttempt>::new(&state.pool).find_404(&id).await?;
    Ok(ApiResponse::success(attempt))
}

pub async fn auth_attempt_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    auth.ensure_root_admin()?;
    Repository::<AuthAttempt>::new(&state.pool).delete_404(&id).await?;
    Ok(ApiResponse::message("Success."))
}
