use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::{FromRow, PgPool};

use super::new_id;
use crate::config;
use crate::database::{DatabaseError, Document, Repository};

/// A failed login, kept for lockout decisions
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuthAttempt {
    #[serde(rename = "_id")]
    pub id: String,
    pub ip: String,
    pub username: String,
    pub time: DateTime<Utc>,
}

impl Document for AuthAttempt {
    const TABLE: &'static str = "auth_attempts";
    const COLUMNS: &'static [&'static str] = &["id", "ip", "username", "time"];
}

impl AuthAttempt {
    pub async fn create(pool: &PgPool, ip: &str, username: &str) -> Result<AuthAttempt, DatabaseError> {
        let attempt = sqlx::query_as::<_, AuthAttempt>(
            "INSERT INTO auth_attempts (id, ip, username, time) VALUES ($1, $2, $3, now())
             RETURNING id, ip, username, time",
        )
        .bind(new_id())
        .bind(ip)
        .bind(username.to_lowercase())
        .fetch_one(pool)
        .await?;
        Ok(attempt)
    }

    /// True once the IP, or the IP and username pair, has failed too often
    pub async fn abuse_detected(pool: &PgPool, ip: &str, username: &str) -> Result<bool, DatabaseError> {
        let repository = Repository::<AuthAttempt>::new(pool);
        let (for_ip, for_ip_and_user) = tokio::try_join!(
            repository.count(json!({ "ip": ip })),
            repository.count(json!({ "ip": ip, "username": username.to_lowercase() })),
        )?;
        Ok(exceeds_limits(for_ip, for_ip_and_user))
    }
}

fn exceeds_limits(for_ip: i64, for_ip_and_user: i64) -> bool {
    let limits = &config::config().auth;
    for_ip >= limits.attempts_for_ip || for_ip_and_user >= limits.attempts_for_ip_and_user
}
