use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor whose rejections use the API error envelope
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// Present and non-blank
pub fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::invalid_field(field, format!("\"{}\" is required", field))),
    }
}

/// Required and made of letters, digits and underscores only
pub fn token(field: &str, value: Option<String>) -> Result<String, ApiError> {
    let value = required(field, value)?;
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(value)
    } else {
        Err(ApiError::invalid_field(
            field,
            format!("\"{}\" must only contain alpha-numeric and underscore characters", field),
        ))
    }
}

/// Required and shaped like `local@domain.tld`
pub fn email(field: &str, value: Option<String>) -> Result<String, ApiError> {
    let value = required(field, value)?.trim().to_string();
    if is_email(&value) {
        Ok(value)
    } else {
        Err(ApiError::invalid_field(field, format!("\"{}\" must be a valid email", field)))
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(required("name", None).is_err());
        assert!(required("name", Some("  ".to_string())).is_err());
        assert_eq!(required("name", Some("Ren".to_string())).unwrap(), "Ren");
    }

    #[test]
    fn tokens() {
        assert!(token("username", Some("ren_hoek2".to_string())).is_ok());
        let err = token("username", Some("ren hoek".to_string())).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_json()["field_errors"]["username"].is_string());
    }

    #[test]
    fn emails() {
        assert!(email("email", Some("ren@stimpy.show".to_string())).is_ok());
        assert!(email("email", Some("ren@localhost".to_string())).is_err());
        assert!(email("email", Some("ren.stimpy.show".to_string())).is_err());
        assert!(email("email", Some("@stimpy.show".to_string())).is_err());
        assert!(email("email", Some("ren@@stimpy.show".to_string())).is_err());
        assert!(email("email", Some("ren@stimpy..show".to_string())).is_err());
    }
}
