use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::decode_basic;
use crate::database::models::{Admin, HydratedRoles, Session, User};
use crate::error::ApiError;
use crate::state::AppState;

const PERMISSION_DENIED: &str = "Permission denied to this resource.";

/// Authenticated request context: the session used, its user and the hydrated role documents
#[derive(Clone, Debug)]
pub struct AuthCredentials {
    /// Role names the user can play (`account`, `admin`)
    pub scope: Vec<String>,
    pub roles: HydratedRoles,
    pub session: Session,
    pub user: User,
}

/// Basic authentication middleware: validates the session credentials and
/// injects [`AuthCredentials`] into the request
pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(credentials);
    Ok(next.run(request).await)
}

/// Resolve `Authorization: Basic base64(sessionId:key)` into credentials
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthCredentials, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Bad HTTP authentication header format"))?;

    let (session_id, key) = decode_basic(auth_header).map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let session = Session::find_by_credentials(&state.pool, &session_id, &key)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Bad username or password"))?;

    if let Err(e) = Session::update_last_active(&state.pool, &session.id).await {
        tracing::warn!("Failed to update last activity for session {}: {}", session.id, e);
    }

    let user = User::find_by_id(&state.pool, &session.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| {
            tracing::warn!("Session {} refers to a missing or inactive user", session.id);
            ApiError::unauthorized("Bad username or password")
        })?;

    let roles = user.hydrate_roles(&state.pool).await?;

    Ok(AuthCredentials {
        scope: user.roles.scope(),
        roles,
        session,
        user,
    })
}

impl AuthCredentials {
    /// The user must be able to play at least one of `roles`
    pub fn ensure_scope(&self, roles: &[&str]) -> Result<(), ApiError> {
        if roles.iter().any(|role| self.user.can_play_role(role)) {
            Ok(())
        } else {
            Err(ApiError::forbidden(PERMISSION_DENIED))
        }
    }

    /// The hydrated admin must belong to at least one of `groups`
    pub fn ensure_admin_group(&self, groups: &[&str]) -> Result<(), ApiError> {
        let member = self
            .roles
            .admin
            .as_ref()
            .is_some_and(|admin| groups.iter().any(|group| admin.is_member_of(group)));
        if member {
            Ok(())
        } else {
            Err(ApiError::forbidden(PERMISSION_DENIED))
        }
    }

    /// Admin role plus membership in the `root` group
    pub fn ensure_root_admin(&self) -> Result<(), ApiError> {
        self.ensure_scope(&["admin"])?;
        self.ensure_admin_group(&["root"])
    }

    pub fn admin(&self) -> Result<&Admin, ApiError> {
        self.roles.admin.as_ref().ok_or_else(|| ApiError::forbidden(PERMISSION_DENIED))
    }

    /// Id of the caller's own account document
    pub fn account_id(&self) -> Result<&str, ApiError> {
        self.user
            .roles
            .account
            .as_ref()
            .map(|link| link.id.as_str())
            .ok_or_else(|| ApiError::forbidden(PERMISSION_DENIED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::http::StatusCode;

    #[test]
    fn scope_follows_user_roles() {
        let credentials = testing::account_credentials();
        assert_eq!(credentials.scope, vec!["account".to_string()]);
        assert!(credentials.ensure_scope(&["account"]).is_ok());
        assert!(credentials.ensure_scope(&["admin", "account"]).is_ok());

        let err = credentials.ensure_scope(&["admin"]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn admin_group_membership() {
        let credentials = testing::admin_credentials(&[("sales", "Sales")]);
        assert!(credentials.ensure_admin_group(&["sales"]).is_ok());
        assert!(credentials.ensure_admin_group(&["root"]).is_err());
        assert!(credentials.ensure_root_admin().is_err());

        let root = testing::admin_credentials(&[("root", "Root")]);
        assert!(root.ensure_root_admin().is_ok());
    }

    #[test]
    fn accounts_are_never_admin_group_members() {
        let credentials = testing::account_credentials();
        assert!(credentials.ensure_admin_group(&["root"]).is_err());
        assert!(credentials.admin().is_err());
        assert!(credentials.account_id().is_ok());
    }
}
