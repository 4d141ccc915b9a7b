// handlers/protected/admin_groups.rs - /api/admin-groups

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};

use super::{PermissionsRequest, PlainNameRequest};
use crate::database::models::AdminGroup;
use crate::database::{PageQuery, Paged, Repository};
use crate::middleware::{ApiResponse, ApiResult, AuthCredentials};
use crate::state::AppState;
use crate::validation::{self, Payload};

pub async fn admin_groups_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paged<Value>> {
    auth.ensure_root_admin()?;
    let paged = Repository::<AdminGroup>::new(&state.pool).paged_find(json!({}), &query).await?;
    Ok(ApiResponse::success(paged))
}

pub async fn admin_group_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<AdminGroup> {
    auth.ensure_root_admin()?;
    let group = Repository::<AdminGroup>::new(&state.pool).find_404(&id).await?;
    Ok(ApiResponse::success(group))
}

/// The new group's id is the slug of its name
pub async fn admin_group_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Payload(payload): Payload<PlainNameRequest>,
) -> ApiResult<AdminGroup> {
    auth.ensure_root_admin()?;
    let name = validation::required("name", payload.name)?;
    let group = AdminGroup::create(&state.pool, &name).await?;
    Ok(ApiResponse::success(group))
}

pub async fn admin_group_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<PlainNameRequest>,
) -> ApiResult<AdminGroup> {
    auth.ensure_root_admin()?;
    let name = validation::required("name", payload.name)?;
    let group = AdminGroup::set_name(&state.pool, &id, &name).await?;
    Ok(ApiResponse::success(group))
}

pub async fn admin_group_set_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<PermissionsRequest>,
) -> ApiResult<AdminGroup> {
    auth.ensure_root_admin()?;
    let permissions = payload.into_permissions()?;
    let group = AdminGroup::set_permissions(&state.pool, &id, &permissions).await?;
    Ok(ApiResponse::success(group))
}

pub async fn admin_group_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    auth.ensure_root_admin()?;
    Repository::<AdminGroup>::new(&state.pool).delete_404(&id).await?;
    Ok(ApiResponse::message("Success."))
}
