use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{types::Json, FromRow, PgPool};

use super::embedded::AccountStatus;
use super::{new_id, Link, Name, NoteEntry, StatusEntry};
use crate::database::{DatabaseError, Document, Repository};

const ACCOUNT_COLUMNS: &str = "id, name, user_link, status, notes, time_created";

/// Customer-facing role record
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    #[sqlx(json)]
    pub name: Name,
    /// Stored as JSON `null` when unlinked
    #[sqlx(json)]
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub user_link: Option<Link>,
    #[sqlx(json)]
    pub status: AccountStatus,
    #[sqlx(json)]
    pub notes: Vec<NoteEntry>,
    pub time_created: DateTime<Utc>,
}

impl Document for Account {
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static [&'static str] = &["id", "name", "user_link", "time_created"];
}

impl Account {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Account, DatabaseError> {
        let name = Name::parse(name);
        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (id, name, user_link, status, notes, time_created)
             VALUES ($1, $2, 'null'::jsonb, $3, '[]'::jsonb, now())
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(new_id())
        .bind(Json(&name))
        .bind(Json(AccountStatus::default()))
        .fetch_one(pool)
        .await?;
        Ok(account)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Account>, DatabaseError> {
        Repository::<Account>::new(pool).find_by_id(id).await
    }

    pub fn full_name(&self) -> String {
        self.name.full()
    }

    pub async fn set_name(pool: &PgPool, id: &str, name: &Name) -> Result<Account, DatabaseError> {
        Self::update_json(pool, id, "name", Json(name)).await
    }

    pub async fn link_user(pool: &PgPool, id: &str, user: &Link) -> Result<Account, DatabaseError> {
        Self::update_json(pool, id, "user_link", Json(Some(user))).await
    }

    pub async fn unlink_user(pool: &PgPool, id: &str) -> Result<Account, DatabaseError> {
        Self::update_json(pool, id, "user_link", Json(None::<&Link>)).await
    }

    pub async fn add_note(pool: &PgPool, id: &str, note: &NoteEntry) -> Result<Account, DatabaseError> {
        sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET notes = notes || jsonb_build_array($2::jsonb) WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(Json(note))
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("accounts {}", id)))
    }

    /// Make `entry` the current status and append it to the log
    pub async fn set_status(pool: &PgPool, id: &str, entry: &StatusEntry) -> Result<Account, DatabaseError> {
        sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts
             SET status = jsonb_build_object(
                 'current', $2::jsonb,
                 'log', COALESCE(status->'log', '[]'::jsonb) || jsonb_build_array($2::jsonb))
             WHERE id = $1
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(Json(entry))
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("accounts {}", id)))
    }

    async fn update_json<T>(pool: &PgPool, id: &str, column: &'static str, value: T) -> Result<Account, DatabaseError>
    where
        T: for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send,
    {
        sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET {} = $2 WHERE id = $1 RETURNING {}",
            column, ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("accounts {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_user_link_as_user() {
        let account = Account {
            id: new_id(),
            name: Name::parse("Stimpson J Cat"),
            user_link: Some(Link { id: "u1".into(), name: "stimpy".into() }),
            status: AccountStatus::default(),
            notes: vec![],
            time_created: Utc::now(),
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["user"]["name"], "stimpy");
        assert!(json.get("userLink").is_none());
        assert_eq!(json["name"]["middle"], "J");
        assert_eq!(account.full_name(), "Stimpson Cat");
    }
}
