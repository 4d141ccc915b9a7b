use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::{types::Json, FromRow, PgPool};

use super::{new_id, Account, Admin, Link, Roles};
use crate::auth::{hash_password, verify_password};
use crate::database::{DatabaseError, Document, Repository};

const USER_COLUMNS: &str =
    "id, is_active, username, password, email, roles, reset_token, reset_expires, time_created";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub is_active: bool,
    pub username: String,
    #[serde(skip)]
    pub password: String,
    pub email: String,
    #[sqlx(json)]
    pub roles: Roles,
    #[serde(skip)]
    pub reset_token: Option<String>,
    #[serde(skip)]
    pub reset_expires: Option<DateTime<Utc>>,
    pub time_created: DateTime<Utc>,
}

impl Document for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["id", "is_active", "username", "email", "roles", "time_created"];
}

/// The account and admin documents a user's role links point at
#[derive(Debug, Clone, Default, Serialize)]
pub struct HydratedRoles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<Admin>,
}

/// Which role link to set or clear on a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Account,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Account => "account",
            Role::Admin => "admin",
        }
    }
}

impl User {
    pub async fn create(pool: &PgPool, username: &str, password: &str, email: &str) -> Result<User, DatabaseError> {
        let hash = hash_password(password).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, is_active, username, password, email, roles, time_created)
             VALUES ($1, TRUE, $2, $3, $4, '{{}}'::jsonb, now())
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(new_id())
        .bind(username.to_lowercase())
        .bind(hash)
        .bind(email.to_lowercase())
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, DatabaseError> {
        Repository::<User>::new(pool).find_by_id(id).await
    }

    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, DatabaseError> {
        Repository::<User>::new(pool)
            .find_one(json!({ "username": username.to_lowercase() }))
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, DatabaseError> {
        Repository::<User>::new(pool)
            .find_one(json!({ "email": email.to_lowercase() }))
            .await
    }

    /// Active user whose password matches. A username containing `@` is looked up by email.
    pub async fn find_by_credentials(pool: &PgPool, username: &str, password: &str) -> Result<Option<User>, DatabaseError> {
        let username = username.to_lowercase();
        let query = if username.contains('@') {
            json!({ "isActive": true, "email": username })
        } else {
            json!({ "isActive": true, "username": username })
        };

        let Some(user) = Repository::<User>::new(pool).find_one(query).await? else {
            return Ok(None);
        };

        if verify_password(password, &user.password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Message describing the first of `username`/`email` already taken by another user
    pub async fn conflict(
        pool: &PgPool,
        username: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> Result<Option<&'static str>, DatabaseError> {
        let repository = Repository::<User>::new(pool);
        let exclude = |field: &str, value: String| match exclude_id {
            Some(id) => json!({ field: value, "_id": { "$ne": id } }),
            None => json!({ field: value }),
        };

        if repository.count(exclude("username", username.to_lowercase())).await? > 0 {
            return Ok(Some("Username already in use."));
        }
        if repository.count(exclude("email", email.to_lowercase())).await? > 0 {
            return Ok(Some("Email already in use."));
        }
        Ok(None)
    }

    pub fn can_play_role(&self, role: &str) -> bool {
        match role {
            "account" => self.roles.account.is_some(),
            "admin" => self.roles.admin.is_some(),
            _ => false,
        }
    }

    /// Load the linked account and admin documents concurrently
    pub async fn hydrate_roles(&self, pool: &PgPool) -> Result<HydratedRoles, DatabaseError> {
        let account = async {
            match &self.roles.account {
                Some(link) => Account::find_by_id(pool, &link.id).await,
                None => Ok(None),
            }
        };
        let admin = async {
            match &self.roles.admin {
                Some(link) => Admin::find_by_id(pool, &link.id).await,
                None => Ok(None),
            }
        };

        let (account, admin) = tokio::try_join!(account, admin)?;
        Ok(HydratedRoles { account, admin })
    }

    pub async fn update(
        pool: &PgPool,
        id: &str,
        is_active: bool,
        username: &str,
        email: &str,
    ) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $2, username = $3, email = $4 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(is_active)
        .bind(username.to_lowercase())
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("users {}", id)))
    }

    /// Update the profile fields a user may change on their own record
    pub async fn update_profile(pool: &PgPool, id: &str, username: &str, email: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = $2, email = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(username.to_lowercase())
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("users {}", id)))
    }

    /// Store a new password hash; any pending reset token is cleared
    pub async fn set_password_hash(pool: &PgPool, id: &str, hash: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET password = $2, reset_token = NULL, reset_expires = NULL WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(hash)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("users {}", id)))
    }

    pub async fn set_reset_token(
        pool: &PgPool,
        id: &str,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET reset_token = $2, reset_expires = $3 WHERE id = $1")
            .bind(id)
            .bind(token_hash)
            .bind(expires)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// User with this email holding a reset token that has not yet expired
    pub async fn find_by_pending_reset(pool: &PgPool, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users
             WHERE email = $1 AND reset_token IS NOT NULL AND reset_expires > now()",
            USER_COLUMNS
        ))
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn link_role(pool: &PgPool, id: &str, role: Role, link: &Link) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET roles = roles || jsonb_build_object($2::text, $3::jsonb) WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .bind(Json(link))
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn unlink_role(pool: &PgPool, id: &str, role: Role) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET roles = roles - $2::text WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: Roles) -> User {
        User {
            id: new_id(),
            is_active: true,
            username: "ren".to_string(),
            password: "$2b$04$hash".to_string(),
            email: "ren@stimpy.show".to_string(),
            roles,
            reset_token: Some("token".to_string()),
            reset_expires: Some(Utc::now()),
            time_created: Utc::now(),
        }
    }

    #[test]
    fn plays_only_linked_roles() {
        let user = user(Roles {
            account: Some(Link { id: "a1".into(), name: "Ren Hoek".into() }),
            admin: None,
        });
        assert!(user.can_play_role("account"));
        assert!(!user.can_play_role("admin"));
        assert!(!user.can_play_role("owner"));
    }

    #[test]
    fn secrets_are_never_serialized() {
        let json = serde_json::to_value(user(Roles::default())).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("resetToken").is_none());
        assert!(json.get("resetExpires").is_none());
        assert_eq!(json["_id"].as_str().map(str::len), Some(32));
        assert_eq!(json["isActive"], true);
        assert!(json.get("timeCreated").is_some());
    }
}
