use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::slugify;
use crate::database::{DatabaseError, Document, Repository};

/// A named state within a pivot, e.g. pivot `Account`, name `Happy`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Status {
    #[serde(rename = "_id")]
    pub id: String,
    pub pivot: String,
    pub name: String,
}

impl Document for Status {
    const TABLE: &'static str = "statuses";
    const COLUMNS: &'static [&'static str] = &["id", "pivot", "name"];
}

impl Status {
    pub fn id_for(pivot: &str, name: &str) -> String {
        slugify(&format!("{} {}", pivot, name))
    }

    pub async fn create(pool: &PgPool, pivot: &str, name: &str) -> Result<Status, DatabaseError> {
        let status = sqlx::query_as::<_, Status>(
            "INSERT INTO statuses (id, pivot, name) VALUES ($1, $2, $3) RETURNING id, pivot, name",
        )
        .bind(Self::id_for(pivot, name))
        .bind(pivot)
        .bind(name)
        .fetch_one(pool)
        .await?;
        Ok(status)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Status>, DatabaseError> {
        Repository::<Status>::new(pool).find_by_id(id).await
    }

    pub async fn set_name(pool: &PgPool, id: &str, name: &str) -> Result<Status, DatabaseError> {
        sqlx::query_as::<_, Status>("UPDATE statuses SET name = $2 WHERE id = $1 RETURNING id, pivot, name")
            .bind(id)
            .bind(name)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("statuses {}", id)))
    }
}
