use serde::Serialize;
use sqlx::{types::Json, FromRow, PgPool};
use std::collections::BTreeMap;

use super::slugify;
use crate::database::{DatabaseError, Document, Repository};

/// Named permission set. The id is the slug of the name, so `"Root"` is `root`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminGroup {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[sqlx(json)]
    pub permissions: BTreeMap<String, bool>,
}

impl Document for AdminGroup {
    const TABLE: &'static str = "admin_groups";
    const COLUMNS: &'static [&'static str] = &["id", "name"];
}

impl AdminGroup {
    pub async fn create(pool: &PgPool, name: &str) -> Result<AdminGroup, DatabaseError> {
        let group = sqlx::query_as::<_, AdminGroup>(
            "INSERT INTO admin_groups (id, name, permissions)
             VALUES ($1, $2, '{}'::jsonb)
             RETURNING id, name, permissions",
        )
        .bind(slugify(name))
        .bind(name)
        .fetch_one(pool)
        .await?;
        Ok(group)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<AdminGroup>, DatabaseError> {
        Repository::<AdminGroup>::new(pool).find_by_id(id).await
    }

    pub fn has_permission_to(&self, permission: &str) -> bool {
        self.permissions.get(permission).copied().unwrap_or(false)
    }

    pub async fn set_name(pool: &PgPool, id: &str, name: &str) -> Result<AdminGroup, DatabaseError> {
        sqlx::query_as::<_, AdminGroup>(
            "UPDATE admin_groups SET name = $2 WHERE id = $1 RETURNING id, name, permissions",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("admin_groups {}", id)))
    }

    pub async fn set_permissions(
        pool: &PgPool,
        id: &str,
        permissions: &BTreeMap<String, bool>,
    ) -> Result<AdminGroup, DatabaseError> {
        sqlx::query_as::<_, AdminGroup>(
            "UPDATE admin_groups SET permissions = $2 WHERE id = $1 RETURNING id, name, permissions",
        )
        .bind(id)
        .bind(Json(permissions))
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("admin_groups {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_default_to_denied() {
        let mut group = AdminGroup {
            id: "sales".to_string(),
            name: "Sales".to_string(),
            permissions: BTreeMap::new(),
        };
        assert!(!group.has_permission_to("SPACE_MADNESS"));

        group.permissions.insert("SPACE_MADNESS".to_string(), true);
        group.permissions.insert("UNTAMED_WORLD".to_string(), false);
        assert!(group.has_permission_to("SPACE_MADNESS"));
        assert!(!group.has_permission_to("UNTAMED_WORLD"));
    }
}
