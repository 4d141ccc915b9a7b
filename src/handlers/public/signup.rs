// handlers/public/signup.rs - POST /api/signup

use axum::extract::State;
use serde::Deserialize;

use super::login::{issue_session, LoginResponse};
use crate::config::{config, EmailAddress};
use crate::database::models::{Account, Link, Role, User};
use crate::error::ApiError;
use crate::mailer::{send_email, templates::WelcomeEmail, EmailOptions};
use crate::middleware::{ApiResponse, ApiResult, ClientInfo};
use crate::state::AppState;
use crate::validation::{self, Payload};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Create a user and its customer account, link them, send the welcome
/// email and log the new user in
pub async fn signup(
    State(state): State<AppState>,
    client: ClientInfo,
    Payload(payload): Payload<SignupRequest>,
) -> ApiResult<LoginResponse> {
    let name = validation::required("name", payload.name)?;
    let email = validation::email("email", payload.email)?;
    let username = validation::token("username", payload.username)?;
    let password = validation::required("password", payload.password)?;

    if let Some(message) = User::conflict(&state.pool, &username, &email, None).await? {
        return Err(ApiError::conflict(message));
    }

    let mut user = User::create(&state.pool, &username, &password, &email).await?;
    let account = Account::create(&state.pool, &name).await?;

    let user_link = Link {
        id: user.id.clone(),
        name: user.username.clone(),
    };
    let account_link = Link {
        id: account.id.clone(),
        name: account.full_name(),
    };
    tokio::try_join!(
        Account::link_user(&state.pool, &account.id, &user_link),
        User::link_role(&state.pool, &user.id, Role::Account, &account_link),
    )?;
    user.roles.account = Some(account_link);

    let config = config();
    let options = EmailOptions {
        subject: format!("Your {} account", config.project_name),
        to: EmailAddress {
            name: name.clone(),
            address: user.email.clone(),
        },
        reply_to: None,
    };
    let template = WelcomeEmail {
        project_name: &config.project_name,
        name: &name,
        username: &user.username,
        email: &user.email,
    };
    if let Err(e) = send_email(state.mailer.as_ref(), options, &template).await {
        tracing::warn!("Failed to send welcome email to {}: {}", user.email, e);
    }

    let response = issue_session(&state, &user, &client).await?;
    tracing::info!(user = %user.username, "New signup");
    Ok(ApiResponse::success(response))
}
