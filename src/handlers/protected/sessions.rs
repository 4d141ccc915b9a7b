// handlers/protected/sessions.rs - /api/sessions
//
// Listing and closing arbitrary sessions is for root admins; the `my`
// routes let any account or admin manage their own.

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};

use crate::database::models::Session;
use crate::database::{PageQuery, Paged, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthCredentials};
use crate::state::AppState;

pub async fn sessions_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paged<Value>> {
    auth.ensure_root_admin()?;
    let query = PageQuery {
        sort: query.sort.or_else(|| Some("_id".to_string())),
        ..query
    };
    let paged = Repository::<Session>::new(&state.pool).paged_find(json!({}), &query).await?;
    Ok(ApiResponse::success(paged))
}

pub async fn session_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Session> {
    auth.ensure_root_admin()?;
    let session = Repository::<Session>::new(&state.pool).find_404(&id).await?;
    Ok(ApiResponse::success(session))
}

pub async fn session_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    auth.ensure_root_admin()?;
    Repository::<Session>::new(&state.pool).delete_404(&id).await?;
    Ok(ApiResponse::message("Success."))
}

/// The caller's sessions, most recently active first
pub async fn sessions_my(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
) -> ApiResult<Vec<Session>> {
    auth.ensure_scope(&["account", "admin"])?;
    let sessions = Session::find_by_user(&state.pool, &auth.user.id).await?;
    Ok(ApiResponse::success(sessions))
}

pub async fn session_my_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCredentials>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    auth.ensure_scope(&["account", "admin"])?;
    ensure_not_current(&auth, &id)?;

    match Session::delete_for_user(&state.pool, &id, &auth.user.id).await? {
        0 => Err(ApiError::document_not_found()),
        _ => Ok(ApiResponse::message("Success.")),
    }
}

fn ensure_not_current(auth: &AuthCredentials, id: &str) -> Result<(), ApiError> {
    if auth.session.id == id {
        return Err(ApiError::bad_request(
            "Unable to close your current session. You can use logout instead.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::http::StatusCode;

    #[test]
    fn current_session_cannot_be_closed_here() {
        let auth = testing::account_credentials();
        let err = ensure_not_current(&auth, &auth.session.id.clone()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(ensure_not_current(&auth, "some-other-session").is_ok());
    }
}
