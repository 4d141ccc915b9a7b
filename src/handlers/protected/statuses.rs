// handlers/protected/statuses.rs - /api/statuses

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::PlainNameRequest;
use crate::database::models::Status;
use crate::database::{PageQuery, Paged, Repository};
use crate::middleware::{ApiResponse, ApiResult, AuthCredentials};
use crate::state::AppState;
use crate::validation::{self, Payload};

pub async fn statuses_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paged<Value>> {
    auth.ensure_root_admin()?;
    let paged = Repository::<Status>::new(&state.pool).paged_find(json!({}), &query).await?;
    Ok(ApiResponse::success(paged))
}

pub async fn status_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Status> {
    auth.ensure_root_admin()?;
    let status = Repository::<Status>::new(&state.pool).find_404(&id).await?;
    Ok(ApiResponse::success(status))
}

#[derive(Debug, Deserialize)]
pub struct StatusCreateRequest {
    pub pivot: Option<String>,
    pub name: Option<String>,
}

pub async fn status_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Payload(payload): Payload<StatusCreateRequest>,
) -> ApiResult<Status> {
    auth.ensure_root_admin()?;
    let pivot = validation::required("pivot", payload.pivot)?;
    let name = validation::required("name", payload.name)?;
    let status = Status::create(&state.pool, &pivot, &name).await?;
    Ok(ApiResponse::success(status))
}

pub async fn status_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<PlainNameRequest>,
) -> ApiResult<Status> {
    auth.ensure_root_admin()?;
    let name = validation::required("name", payload.name)?;
    let status = Status::set_name(&state.pool, &id, &name).await?;
    Ok(ApiResponse::success(status))
}

pub async fn status_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    auth.ensure_root_admin()?;
    Repository::<Status>::new(&state.pool).delete_404(&id).await?;
    Ok(ApiResponse::message("Success."))
}
