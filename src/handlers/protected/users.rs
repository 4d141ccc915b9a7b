// handlers/protected/users.rs - /api/users
//
// Root admins manage every user. The `my` routes let any account or admin
// edit their own profile and password.

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::project;
use crate::auth::hash_password;
use crate::database::models::User;
use crate::database::{PageQuery, Paged, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthCredentials};
use crate::state::AppState;
use crate::validation::{self, Payload};

const SELF_SCOPE: &[&str] = &["account", "admin"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersQuery {
    pub username: Option<String>,
    pub is_active: Option<String>,
    pub role: Option<String>,
    pub fields: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl UsersQuery {
    /// Conditions for the list: username contains (case-insensitive),
    /// `isActive` equal to `"true"`, and presence of a role link
    pub fn conditions(&self) -> Result<Value, ApiError> {
        let mut conditions = Map::new();

        if let Some(username) = self.username.clone().filter(|u| !u.is_empty()) {
            let username = validation::token("username", Some(username))?;
            conditions.insert(
                "username".to_string(),
                json!({ "$ilike": format!("%{}%", username.replace('_', "\\_")) }),
            );
        }
        if let Some(is_active) = &self.is_active {
            conditions.insert("isActive".to_string(), json!(is_active == "true"));
        }
        if let Some(role) = self.role.as_deref().filter(|r| !r.is_empty()) {
            conditions.insert(format!("roles.{}", role), json!({ "$exists": true }));
        }

        Ok(Value::Object(conditions))
    }

    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            fields: self.fields.clone(),
            sort: self.sort.clone(),
            limit: self.limit,
            page: self.page,
        }
    }
}

pub async fn users_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Query(query): Query<UsersQuery>,
) -> ApiResult<Paged<Value>> {
    auth.ensure_root_admin()?;
    let paged = Repository::<User>::new(&state.pool)
        .paged_find(query.conditions()?, &query.page_query())
        .await?;
    Ok(ApiResponse::success(paged))
}

pub async fn user_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    auth.ensure_root_admin()?;
    let user = Repository::<User>::new(&state.pool).find_404(&id).await?;
    Ok(ApiResponse::success(user))
}

#[derive(Debug, Deserialize)]
pub struct UserCreateRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

pub async fn user_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Payload(payload): Payload<UserCreateRequest>,
) -> ApiResult<User> {
    auth.ensure_root_admin()?;
    let username = validation::token("username", payload.username)?;
    let password = validation::required("password", payload.password)?;
    let email = validation::email("email", payload.email)?;

    if let Some(message) = User::conflict(&state.pool, &username, &email, None).await? {
        return Err(ApiError::conflict(message));
    }

    let user = User::create(&state.pool, &username, &password, &email).await?;
    Ok(ApiResponse::success(user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    pub is_active: Option<bool>,
    pub username: Option<String>,
    pub email: Option<String>,
}

pub async fn user_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<UserUpdateRequest>,
) -> ApiResult<User> {
    auth.ensure_root_admin()?;
    let is_active = payload
        .is_active
        .ok_or_else(|| ApiError::invalid_field("isActive", "\"isActive\" is required"))?;
    let username = validation::token("username", payload.username)?;
    let email = validation::email("email", payload.email)?;

    if let Some(message) = User::conflict(&state.pool, &username, &email, Some(&id)).await? {
        return Err(ApiError::conflict(message));
    }

    let user = User::update(&state.pool, &id, is_active, &username, &email).await?;
    Ok(ApiResponse::success(user))
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: Option<String>,
}

pub async fn user_set_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
    Payload(payload): Payload<PasswordRequest>,
) -> ApiResult<User> {
    auth.ensure_root_admin()?;
    let password = validation::required("password", payload.password)?;
    let hash = hash_password(&password).await?;
    let user = User::set_password_hash(&state.pool, &id, &hash).await?;
    Ok(ApiResponse::success(user))
}

pub async fn user_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    auth.ensure_root_admin()?;
    Repository::<User>::new(&state.pool).delete_404(&id).await?;
    Ok(ApiResponse::message("Success."))
}

pub async fn user_my(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
) -> ApiResult<Value> {
    auth.ensure_scope(SELF_SCOPE)?;
    let user = User::find_by_id(&state.pool, &auth.user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document not found. That is strange."))?;
    Ok(ApiResponse::success(project(&user, "username email roles")?))
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

pub async fn user_my_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Payload(payload): Payload<ProfileRequest>,
) -> ApiResult<Value> {
    auth.ensure_scope(SELF_SCOPE)?;
    let username = validation::token("username", payload.username)?;
    let email = validation::email("email", payload.email)?;

    if let Some(message) = User::conflict(&state.pool, &username, &email, Some(&auth.user.id)).await? {
        return Err(ApiError::conflict(message));
    }

    let user = User::update_profile(&state.pool, &auth.user.id, &username, &email).await?;
    Ok(ApiResponse::success(project(&user, "username email")?))
}

pub async fn user_my_set_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Payload(payload): Payload<PasswordRequest>,
) -> ApiResult<Value> {
    auth.ensure_scope(SELF_SCOPE)?;
    let password = validation::required("password", payload.password)?;
    let hash = hash_password(&password).await?;
    let user = User::set_password_hash(&state.pool, &auth.user.id, &hash).await?;
    Ok(ApiResponse::success(project(&user, "username email")?))
}
