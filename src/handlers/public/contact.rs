// handlers/public/contact.rs - POST /api/contact

use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{config, EmailAddress};
use crate::mailer::{send_email, templates::ContactEmail, EmailOptions};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{self, Payload};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// Forward a contact form message to the system address, replying to the sender
pub async fn contact(State(state): State<AppState>, Payload(payload): Payload<ContactRequest>) -> ApiResult<Value> {
    let name = validation::required("name", payload.name)?;
    let email = validation::email("email", payload.email)?;
    let message = validation::required("message", payload.message)?;

    let config = config();
    let options = EmailOptions {
        subject: format!("{} contact form", config.project_name),
        to: config.system.to_address.clone(),
        reply_to: Some(EmailAddress {
            name: name.clone(),
            address: email.clone(),
        }),
    };
    let template = ContactEmail {
        name: &name,
        email: &email,
        message: &message,
    };

    send_email(state.mailer.as_ref(), options, &template).await?;
    Ok(ApiResponse::message("Success."))
}
