use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::auth::password::PasswordError;
use crate::config::DatabaseConfig;
use crate::filter::error::FilterError;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default();
                let message = if constraint.contains("username") {
                    "Username already in use."
                } else if constraint.contains("email") {
                    "Email already in use."
                } else {
                    "Duplicate key."
                };
                return DatabaseError::Duplicate(message.to_string());
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Owns pool construction, connectivity checks and migrations
pub struct DatabaseManager;

impl DatabaseManager {
    /// Build the shared pool. Connections are opened on first use so the
    /// server can start (and report unhealthy) without a reachable database.
    pub fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(&config.url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&connection_string)?;

        info!(
            "Created database pool (max {} connections)",
            config.max_connections
        );
        Ok(pool)
    }

    fn build_connection_string(base: &str) -> Result<String, DatabaseError> {
        let url = url::Url::parse(base).map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?;
        match url.scheme() {
            "postgres" | "postgresql" => {}
            other => return Err(DatabaseError::InvalidDatabaseUrl(format!("unsupported scheme '{}'", other))),
        }
        if url.path().trim_start_matches('/').is_empty() {
            return Err(DatabaseError::InvalidDatabaseUrl("missing database name".to_string()));
        }
        Ok(url.into())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}
