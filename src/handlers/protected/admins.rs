// handlers/protected/admins.rs - /api/admins
//
// All routes require the admin role plus the root group.

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{NameRequest, PermissionsRequest, PlainNameRequest, UsernameRequest};
use crate::database::models::{Admin, Link, Role, User};
use crate::database::{PageQuery, Paged, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthCredentials};
use crate::state::AppState;
use crate::validation::{self, Payload};

pub async fn admins_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paged<Value>> {
    auth.ensure_root_admin()?;
    let paged = Repository::<Admin>::new(&state.pool).paged_find(json!({}), &query).await?;
    Ok(ApiResponse::success(paged))
}

pub async fn admin_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Admin> {
    auth.ensure_root_admin()?;
    let admin = Repository::<Admin>::new(&state.pool).find_404(&id).await?;
    Ok(ApiResponse::success(admin))
}

pub async fn admin_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Payload(payload): Payload<PlainNameRequest>,
) -> ApiResult<Admin> {
    auth.ensure_root_admin()?;
    let name = validation::required("name", payload.name)?;
    let admin = Admin::create(&state.pool, &name).await?;
    Ok(ApiResponse::success(admin))
}

pub async fn admin_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<NameRequest>,
) -> ApiResult<Admin> {
    auth.ensure_root_admin()?;
    let name = payload.into_name()?;
    let admin = Admin::set_name(&state.pool, &id, &name).await?;
    Ok(ApiResponse::success(admin))
}

pub async fn admin_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    auth.ensure_root_admin()?;
    Repository::<Admin>::new(&state.pool).delete_404(&id).await?;
    Ok(ApiResponse::message("Success."))
}

pub async fn admin_set_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<PermissionsRequest>,
) -> ApiResult<Admin> {
    auth.ensure_root_admin()?;
    let permissions = payload.into_permissions()?;
    let admin = Admin::set_permissions(&state.pool, &id, &permissions).await?;
    Ok(ApiResponse::success(admin))
}

/// `{"groups": {"groupId": "Group Name"}}`
#[derive(Debug, Deserialize)]
pub struct GroupsRequest {
    pub groups: Option<BTreeMap<String, String>>,
}

pub async fn admin_set_groups(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<GroupsRequest>,
) -> ApiResult<Admin> {
    auth.ensure_root_admin()?;
    let groups = payload
        .groups
        .ok_or_else(|| ApiError::invalid_field("groups", "\"groups\" is required"))?;
    let admin = Admin::set_groups(&state.pool, &id, &groups).await?;
    Ok(ApiResponse::success(admin))
}

pub async fn admin_link_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<UsernameRequest>,
) -> ApiResult<Admin> {
    auth.ensure_root_admin()?;
    let username = validation::required("username", payload.username)?;

    let admin = Repository::<Admin>::new(&state.pool).find_404(&id).await?;
    let user = User::find_by_username(&state.pool, &username)
        .await?
        .ok_or_else(|| ApiError::not_found("User document not found."))?;

    if user.roles.admin.as_ref().is_some_and(|link| link.id != admin.id) {
        return Err(ApiError::conflict("User is already linked to another admin. Unlink first."));
    }
    if admin.user_link.as_ref().is_some_and(|link| link.id != user.id) {
        return Err(ApiError::conflict("Admin is already linked to another user. Unlink first."));
    }

    let user_link = Link {
        id: user.id.clone(),
        name: user.username.clone(),
    };
    let admin_link = Link {
        id: admin.id.clone(),
        name: admin.full_name(),
    };
    let (admin, ()) = tokio::try_join!(
        Admin::link_user(&state.pool, &admin.id, &user_link),
        User::link_role(&state.pool, &user.id, Role::Admin, &admin_link),
    )?;

    Ok(ApiResponse::success(admin))
}

pub async fn admin_unlink_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Admin> {
    auth.ensure_root_admin()?;

    let admin = Repository::<Admin>::new(&state.pool).find_404(&id).await?;
    let Some(link) = admin.user_link.clone() else {
        return Ok(ApiResponse::success(admin));
    };
    let user = User::find_by_id(&state.pool, &link.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User document not found."))?;

    let (admin, ()) = tokio::try_join!(
        Admin::unlink_user(&state.pool, &admin.id),
        User::unlink_role(&state.pool, &user.id, Role::Admin),
    )?;

    Ok(ApiResponse::success(admin))
}
