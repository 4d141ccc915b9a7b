// handlers/protected/accounts.rs - /api/accounts
//
// Admin routes need the admin role plus the root group, except notes and
// status which any admin may add. The `my` routes serve the caller's own account.

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{project, NameRequest, PlainNameRequest, UsernameRequest};
use crate::database::models::{Account, Link, NoteEntry, Role, Status, StatusEntry, User};
use crate::database::{PageQuery, Paged, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthCredentials};
use crate::state::AppState;
use crate::validation::{self, Payload};

const MY_FIELDS: &str = "user name timeCreated";

pub async fn accounts_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paged<Value>> {
    auth.ensure_root_admin()?;
    let paged = Repository::<Account>::new(&state.pool).paged_find(json!({}), &query).await?;
    Ok(ApiResponse::success(paged))
}

pub async fn account_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Account> {
    auth.ensure_root_admin()?;
    let account = Repository::<Account>::new(&state.pool).find_404(&id).await?;
    Ok(ApiResponse::success(account))
}

pub async fn account_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Payload(payload): Payload<PlainNameRequest>,
) -> ApiResult<Account> {
    auth.ensure_root_admin()?;
    let name = validation::required("name", payload.name)?;
    let account = Account::create(&state.pool, &name).await?;
    Ok(ApiResponse::success(account))
}

pub async fn account_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<NameRequest>,
) -> ApiResult<Account> {
    auth.ensure_root_admin()?;
    let name = payload.into_name()?;
    let account = Account::set_name(&state.pool, &id, &name).await?;
    Ok(ApiResponse::success(account))
}

pub async fn account_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    auth.ensure_root_admin()?;
    Repository::<Account>::new(&state.pool).delete_404(&id).await?;
    Ok(ApiResponse::message("Success."))
}

pub async fn account_my(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
) -> ApiResult<Value> {
    auth.ensure_scope(&["account"])?;
    let account = Account::find_by_id(&state.pool, auth.account_id()?)
        .await?
        .ok_or_else(|| ApiError::not_found("Document not found. That is strange."))?;
    Ok(ApiResponse::success(project(&account, MY_FIELDS)?))
}

pub async fn account_my_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Payload(payload): Payload<NameRequest>,
) -> ApiResult<Value> {
    auth.ensure_scope(&["account"])?;
    let name = payload.into_name()?;
    let account = Account::set_name(&state.pool, auth.account_id()?, &name).await?;
    Ok(ApiResponse::success(project(&account, MY_FIELDS)?))
}

/// Link the account to the user named in the payload, and the user back to the account
pub async fn account_link_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<UsernameRequest>,
) -> ApiResult<Account> {
    auth.ensure_root_admin()?;
    let username = validation::required("username", payload.username)?;

    let account = Repository::<Account>::new(&state.pool).find_404(&id).await?;
    let user = User::find_by_username(&state.pool, &username)
        .await?
        .ok_or_else(|| ApiError::not_found("User document not found."))?;

    if user.roles.account.as_ref().is_some_and(|link| link.id != account.id) {
        return Err(ApiError::conflict("User is already linked to another account. Unlink first."));
    }
    if account.user_link.as_ref().is_some_and(|link| link.id != user.id) {
        return Err(ApiError::conflict("Account is already linked to another user. Unlink first."));
    }

    let user_link = Link {
        id: user.id.clone(),
        name: user.username.clone(),
    };
    let account_link = Link {
        id: account.id.clone(),
        name: account.full_name(),
    };
    let (account, ()) = tokio::try_join!(
        Account::link_user(&state.pool, &account.id, &user_link),
        User::link_role(&state.pool, &user.id, Role::Account, &account_link),
    )?;

    Ok(ApiResponse::success(account))
}

pub async fn account_unlink_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Account> {
    auth.ensure_root_admin()?;

    let account = Repository::<Account>::new(&state.pool).find_404(&id).await?;
    let Some(link) = account.user_link.clone() else {
        return Ok(ApiResponse::success(account));
    };
    let user = User::find_by_id(&state.pool, &link.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User document not found."))?;

    let (account, ()) = tokio::try_join!(
        Account::unlink_user(&state.pool, &account.id),
        User::unlink_role(&state.pool, &user.id, Role::Account),
    )?;

    Ok(ApiResponse::success(account))
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub data: Option<String>,
}

pub async fn account_add_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<NoteRequest>,
) -> ApiResult<Account> {
    auth.ensure_scope(&["admin"])?;
    let note = NoteEntry {
        data: validation::required("data", payload.data)?,
        time_created: Utc::now(),
        user_created: creator(&auth),
    };
    let account = Account::add_note(&state.pool, &id, &note).await?;
    Ok(ApiResponse::success(account))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// Make the named status current and append it to the account's status log
pub async fn account_set_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<StatusRequest>,
) -> ApiResult<Account> {
    auth.ensure_scope(&["admin"])?;
    let status_id = validation::required("status", payload.status)?;
    let status = Repository::<Status>::new(&state.pool).find_404(&status_id).await?;

    let entry = StatusEntry {
        id: status.id,
        name: status.name,
        time_created: Utc::now(),
        user_created: creator(&auth),
    };
    let account = Account::set_status(&state.pool, &id, &entry).await?;
    Ok(ApiResponse::success(account))
}

fn creator(auth: &AuthCredentials) -> Link {
    Link {
        id: auth.user.id.clone(),
        name: auth.user.username.clone(),
    }
}
