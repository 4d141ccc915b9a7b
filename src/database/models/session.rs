use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::{FromRow, PgPool};

use super::new_id;
use crate::auth::{generate_key_hash, verify_password};
use crate::database::{DatabaseError, Document, Repository};

const SESSION_COLUMNS: &str = "id, user_id, key, time, last_active, ip, browser, os";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    /// bcrypt hash of the session key
    #[serde(skip)]
    pub key: String,
    pub time: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub ip: String,
    pub browser: String,
    pub os: String,
}

impl Document for Session {
    const TABLE: &'static str = "sessions";
    const COLUMNS: &'static [&'static str] = &["id", "user_id", "time", "last_active", "ip", "browser", "os"];
}

/// A session just created, together with the plain key handed to the client
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub key: String,
}

impl Session {
    pub async fn create(pool: &PgPool, user_id: &str, ip: &str, user_agent: &str) -> Result<IssuedSession, DatabaseError> {
        let key_hash = generate_key_hash().await?;
        let (browser, os) = parse_user_agent(user_agent);

        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (id, user_id, key, time, last_active, ip, browser, os)
             VALUES ($1, $2, $3, now(), now(), $4, $5, $6)
             RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(new_id())
        .bind(user_id)
        .bind(&key_hash.hash)
        .bind(ip)
        .bind(browser)
        .bind(os)
        .fetch_one(pool)
        .await?;

        Ok(IssuedSession { session, key: key_hash.key })
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Session>, DatabaseError> {
        Repository::<Session>::new(pool).find_by_id(id).await
    }

    /// The session with this id, provided `key` matches its stored hash
    pub async fn find_by_credentials(pool: &PgPool, id: &str, key: &str) -> Result<Option<Session>, DatabaseError> {
        let Some(session) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        if verify_password(key, &session.key).await? {
            Ok(Some(session))
        } else {
            Ok(None)
        }
    }

    pub async fn find_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<Session>, DatabaseError> {
        Repository::<Session>::new(pool)
            .select_any(crate::filter::FilterData {
                where_clause: Some(json!({ "userId": user_id })),
                order: Some(json!("-lastActive")),
                ..Default::default()
            })
            .await
    }

    pub async fn update_last_active(pool: &PgPool, id: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE sessions SET last_active = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete a session only if it belongs to `user_id`
    pub async fn delete_for_user(pool: &PgPool, id: &str, user_id: &str) -> Result<u64, DatabaseError> {
        Repository::<Session>::new(pool)
            .delete_many(json!({ "_id": id, "userId": user_id }))
            .await
    }
}

/// Coarse browser and OS names from a User-Agent header. Unknown browsers
/// fall back to the raw header text.
pub fn parse_user_agent(user_agent: &str) -> (String, String) {
    let ua = user_agent.trim();

    let browser = if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge"
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("Firefox/") {
        "Firefox"
    } else if ua.contains("Chromium/") {
        "Chromium"
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        "Chrome"
    } else if ua.contains("Safari/") {
        "Safari"
    } else if ua.contains("MSIE ") || ua.contains("Trident/") {
        "IE"
    } else if ua.is_empty() {
        "Other"
    } else {
        ua
    };

    let os = if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("iPhone") || ua.contains("iPad") {
        "iOS"
    } else if ua.contains("Mac OS X") {
        "Mac OS X"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        "Other"
    };

    (browser.to_string(), os.to_string())
}
