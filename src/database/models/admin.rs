use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::{types::Json, FromRow, PgPool};
use std::collections::BTreeMap;

use super::{new_id, AdminGroup, Link, Name};
use crate::database::{DatabaseError, Document, Repository};

const ADMIN_COLUMNS: &str = "id, name, user_link, groups, permissions, time_created";

/// Administrative role record. `groups` maps group id to group name.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: String,
    #[sqlx(json)]
    pub name: Name,
    #[sqlx(json)]
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub user_link: Option<Link>,
    #[sqlx(json)]
    pub groups: BTreeMap<String, String>,
    #[sqlx(json)]
    pub permissions: BTreeMap<String, bool>,
    pub time_created: DateTime<Utc>,
}

impl Document for Admin {
    const TABLE: &'static str = "admins";
    const COLUMNS: &'static [&'static str] = &["id", "name", "user_link", "groups", "time_created"];
}

impl Admin {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Admin, DatabaseError> {
        Self::create_with_groups(pool, name, &BTreeMap::new()).await
    }

    pub async fn create_with_groups(
        pool: &PgPool,
        name: &str,
        groups: &BTreeMap<String, String>,
    ) -> Result<Admin, DatabaseError> {
        let name = Name::parse(name);
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "INSERT INTO admins (id, name, user_link, groups, permissions, time_created)
             VALUES ($1, $2, 'null'::jsonb, $3, '{{}}'::jsonb, now())
             RETURNING {}",
            ADMIN_COLUMNS
        ))
        .bind(new_id())
        .bind(Json(&name))
        .bind(Json(groups))
        .fetch_one(pool)
        .await?;
        Ok(admin)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Admin>, DatabaseError> {
        Repository::<Admin>::new(pool).find_by_id(id).await
    }

    pub fn full_name(&self) -> String {
        self.name.full()
    }

    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// An explicit admin-level permission wins; otherwise any of the admin's
    /// groups granting it is enough.
    pub async fn has_permission_to(&self, pool: &PgPool, permission: &str) -> Result<bool, DatabaseError> {
        if let Some(granted) = self.permissions.get(permission) {
            return Ok(*granted);
        }
        if self.groups.is_empty() {
            return Ok(false);
        }

        let ids: Vec<&String> = self.groups.keys().collect();
        let groups = Repository::<AdminGroup>::new(pool)
            .select_any(crate::filter::FilterData::with_where(json!({ "_id": { "$in": ids } })))
            .await?;

        Ok(groups.iter().any(|group| group.has_permission_to(permission)))
    }

    pub async fn set_name(pool: &PgPool, id: &str, name: &Name) -> Result<Admin, DatabaseError> {
        Self::update_json(pool, id, "name", Json(name)).await
    }

    pub async fn set_groups(pool: &PgPool, id: &str, groups: &BTreeMap<String, String>) -> Result<Admin, DatabaseError> {
        Self::update_json(pool, id, "groups", Json(groups)).await
    }

    pub async fn set_permissions(pool: &PgPool, id: &str, permissions: &BTreeMap<String, bool>) -> Result<Admin, DatabaseError> {
        Self::update_json(pool, id, "permissions", Json(permissions)).await
    }

    pub async fn link_user(pool: &PgPool, id: &str, user: &Link) -> Result<Admin, DatabaseError> {
        Self::update_json(pool, id, "user_link", Json(Some(user))).await
    }

    pub async fn unlink_user(pool: &PgPool, id: &str) -> Result<Admin, DatabaseError> {
        Self::update_json(pool, id, "user_link", Json(None::<&Link>)).await
    }

    async fn update_json<T>(pool: &PgPool, id: &str, column: &'static str, value: T) -> Result<Admin, DatabaseError>
    where
        T: for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send,
    {
        sqlx::query_as::<_, Admin>(&format!(
            "UPDATE admins SET {} = $2 WHERE id = $1 RETURNING {}",
            column, ADMIN_COLUMNS
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("admins {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Admin {
        Admin {
            id: new_id(),
            name: Name::parse("Ren Hoek"),
            user_link: None,
            groups: BTreeMap::from([("sales".to_string(), "Sales".to_string())]),
            permissions: BTreeMap::from([("SPACE_MADNESS".to_string(), true)]),
            time_created: Utc::now(),
        }
    }

    #[test]
    fn membership_is_by_group_id() {
        let admin = admin();
        assert!(admin.is_member_of("sales"));
        assert!(!admin.is_member_of("Sales"));
        assert!(!admin.is_member_of("root"));
    }

    #[tokio::test]
    async fn admin_level_permission_short_circuits() {
        // The explicit grant is answered without touching the pool
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/frame_nowhere")
            .unwrap();
        let mut admin = admin();
        assert!(admin.has_permission_to(&pool, "SPACE_MADNESS").await.unwrap());

        admin.permissions.insert("UNTAMED_WORLD".to_string(), false);
        admin.groups.clear();
        assert!(!admin.has_permission_to(&pool, "UNTAMED_WORLD").await.unwrap());
        assert!(!admin.has_permission_to(&pool, "ANYTHING").await.unwrap());
    }
}
