// handlers/public/login.rs - POST /api/login, /api/login/forgot, /api/login/reset

use axum::extract::State;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{encode_basic, generate_key_hash, hash_password, verify_password};
use crate::config::{config, EmailAddress};
use crate::database::{
    models::{AuthAttempt, Roles, Session, User},
    DatabaseError,
};
use crate::error::ApiError;
use crate::mailer::{send_email, templates::ForgotPasswordEmail, EmailOptions};
use crate::middleware::{ApiResponse, ApiResult, ClientInfo};
use crate::state::AppState;
use crate::validation::{self, Payload};

const INVALID_RESET: &str = "Invalid email or key.";

#[derive(Debug, Serialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub roles: Roles,
}

/// Reply to a successful login or signup: the user, the new session (with
/// its plain key) and a ready-made `Authorization` header value
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserSummary,
    pub session: Value,
    pub auth_header: String,
}

/// Open a session for `user` and build the login reply
pub async fn issue_session(state: &AppState, user: &User, client: &ClientInfo) -> Result<LoginResponse, ApiError> {
    let issued = Session::create(&state.pool, &user.id, &client.ip, &client.user_agent).await?;

    let mut session = serde_json::to_value(&issued.session).map_err(DatabaseError::from)?;
    session["key"] = Value::String(issued.key.clone());

    Ok(LoginResponse {
        user: UserSummary {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
        },
        session,
        auth_header: encode_basic(&issued.session.id, &issued.key),
    })
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Payload(payload): Payload<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let username = validation::required("username", payload.username)?.to_lowercase();
    let password = validation::required("password", payload.password)?;

    if AuthAttempt::abuse_detected(&state.pool, &client.ip, &username).await? {
        tracing::warn!(ip = %client.ip, username = %username, "Login blocked after too many attempts");
        return Err(ApiError::bad_request(
            "Maximum number of auth attempts reached. Please try again later.",
        ));
    }

    let Some(user) = User::find_by_credentials(&state.pool, &username, &password).await? else {
        AuthAttempt::create(&state.pool, &client.ip, &username).await?;
        tracing::info!(ip = %client.ip, username = %username, "Failed login");
        return Err(ApiError::bad_request(
            "Username and password combination not found or account is inactive.",
        ));
    };

    let response = issue_session(&state, &user, &client).await?;
    tracing::info!(user = %user.username, "User logged in");
    Ok(ApiResponse::success(response))
}

#[derive(Debug, Deserialize)]
pub struct ForgotRequest {
    pub email: Option<String>,
}

/// Store a hashed reset token and email the plain key. Unknown addresses
/// get the same reply so the endpoint does not reveal who is registered.
pub async fn login_forgot(State(state): State<AppState>, Payload(payload): Payload<ForgotRequest>) -> ApiResult<Value> {
    let email = validation::email("email", payload.email)?;

    let Some(user) = User::find_by_email(&state.pool, &email).await? else {
        return Ok(ApiResponse::message("Success."));
    };

    let config = config();
    let key_hash = generate_key_hash().await?;
    let expires = Utc::now() + Duration::milliseconds(config.auth.reset_token_ttl_ms);
    User::set_reset_token(&state.pool, &user.id, &key_hash.hash, expires).await?;

    let options = EmailOptions {
        subject: format!("Reset your {} password", config.project_name),
        to: EmailAddress {
            name: String::new(),
            address: user.email.clone(),
        },
        reply_to: None,
    };
    let template = ForgotPasswordEmail {
        project_name: &config.project_name,
        key: &key_hash.key,
    };
    send_email(state.mailer.as_ref(), options, &template).await?;

    Ok(ApiResponse::message("Success."))
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub key: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn login_reset(State(state): State<AppState>, Payload(payload): Payload<ResetRequest>) -> ApiResult<Value> {
    let key = validation::required("key", payload.key)?;
    let email = validation::email("email", payload.email)?;
    let password = validation::required("password", payload.password)?;

    let user = User::find_by_pending_reset(&state.pool, &email)
        .await?
        .ok_or_else(|| ApiError::bad_request(INVALID_RESET))?;

    let token = user.reset_token.as_deref().unwrap_or_default();
    if !verify_password(&key, token).await? {
        return Err(ApiError::bad_request(INVALID_RESET));
    }

    let hash = hash_password(&password).await?;
    User::set_password_hash(&state.pool, &user.id, &hash).await?;
    tracing::info!(user = %user.username, "Password reset");

    Ok(ApiResponse::message("Success."))
}
