// handlers/protected/mod.rs - Protected handlers (session basic auth required)
//
// Security Level: basic_auth_middleware has resolved AuthCredentials before any
// handler here runs. Role scope and admin group checks happen per handler.
// Route Prefix: /api

pub mod accounts;
pub mod admin_groups;
pub mod admins;
pub mod auth_attempts;
pub mod sessions;
pub mod statuses;
pub mod users;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::database::{models::Name, DatabaseError};
use crate::error::ApiError;
use crate::filter::Projection;
use crate::validation;

/// Serialize `document` and keep only `fields` (plus `_id`)
pub(crate) fn project<T: Serialize>(document: &T, fields: &str) -> Result<Value, ApiError> {
    let value = serde_json::to_value(document).map_err(DatabaseError::from)?;
    Ok(match Projection::from_adapter(fields)? {
        Some(projection) => projection.apply(value),
        None => value,
    })
}

#[derive(Debug, Deserialize)]
pub struct NameInput {
    pub first: Option<String>,
    pub middle: Option<String>,
    pub last: Option<String>,
}

/// `{"name": {"first", "middle", "last"}}`; middle may be empty
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: Option<NameInput>,
}

impl NameRequest {
    pub fn into_name(self) -> Result<Name, ApiError> {
        let name = self
            .name
            .ok_or_else(|| ApiError::invalid_field("name", "\"name\" is required"))?;
        Ok(Name {
            first: validation::required("name.first", name.first)?,
            middle: name.middle.filter(|m| !m.trim().is_empty()),
            last: validation::required("name.last", name.last)?,
        })
    }
}

/// `{"name": "..."}` for creates and renames
#[derive(Debug, Deserialize)]
pub struct PlainNameRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionsRequest {
    pub permissions: Option<BTreeMap<String, bool>>,
}

impl PermissionsRequest {
    pub fn into_permissions(self) -> Result<BTreeMap<String, bool>, ApiError> {
        self.permissions
            .ok_or_else(|| ApiError::invalid_field("permissions", "\"permissions\" is required"))
    }
}

#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_requires_first_and_last() {
        let request: NameRequest =
            serde_json::from_value(json!({ "name": { "first": "Ren", "middle": "", "last": "Hoek" } })).unwrap();
        let name = request.into_name().unwrap();
        assert_eq!(name.full(), "Ren Hoek");
        assert_eq!(name.middle, None);

        let request: NameRequest = serde_json::from_value(json!({ "name": { "first": "Ren" } })).unwrap();
        assert!(request.into_name().is_err());

        let request: NameRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.into_name().is_err());
    }

    #[test]
    fn projection_keeps_id() {
        let value = project(&json!({ "_id": "a", "name": "Root", "permissions": {} }), "name").unwrap();
        assert_eq!(value, json!({ "_id": "a", "name": "Root" }));
    }

    #[test]
    fn permissions_are_required() {
        let request: PermissionsRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.into_permissions().is_err());

        let request: PermissionsRequest =
            serde_json::from_value(json!({ "permissions": { "SPACE_MADNESS": true } })).unwrap();
        assert_eq!(request.into_permissions().unwrap().get("SPACE_MADNESS"), Some(&true));
    }
}
