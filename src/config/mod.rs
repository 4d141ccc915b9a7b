use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub project_name: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub mailer: MailerConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Test,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Failed logins allowed from a single IP before it is locked out
    pub attempts_for_ip: i64,
    /// Failed logins allowed for one IP and username pair
    pub attempts_for_ip_and_user: i64,
    pub bcrypt_cost: u32,
    /// Lifetime of a password reset token
    pub reset_token_ttl_ms: i64,
    pub realm: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// No host means mail is written to the log instead of being delivered
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_secure: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub from_address: EmailAddress,
    pub to_address: EmailAddress,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("test") => Environment::Test,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Test => Self::test(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PROJECT_NAME") {
            self.project_name = v;
        }

        // Server overrides
        if let Some(port) = env::var("FRAME_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.server.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_AUTO_MIGRATE") {
            self.database.auto_migrate = v.parse().unwrap_or(self.database.auto_migrate);
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_ATTEMPTS_FOR_IP") {
            self.auth.attempts_for_ip = v.parse().unwrap_or(self.auth.attempts_for_ip);
        }
        if let Ok(v) = env::var("AUTH_ATTEMPTS_FOR_IP_AND_USER") {
            self.auth.attempts_for_ip_and_user = v.parse().unwrap_or(self.auth.attempts_for_ip_and_user);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.auth.bcrypt_cost = v.parse().unwrap_or(self.auth.bcrypt_cost);
        }

        // Mailer overrides
        if let Ok(v) = env::var("SMTP_HOST") {
            self.mailer.smtp_host = Some(v).filter(|h| !h.is_empty());
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.mailer.smtp_port = v.parse().unwrap_or(self.mailer.smtp_port);
        }
        if let Ok(v) = env::var("SMTP_SECURE") {
            self.mailer.smtp_secure = v.parse().unwrap_or(self.mailer.smtp_secure);
        }
        if let Ok(v) = env::var("SMTP_USERNAME") {
            self.mailer.smtp_username = Some(v);
        }
        if let Ok(v) = env::var("SMTP_PASSWORD") {
            self.mailer.smtp_password = Some(v);
        }

        // System addresses
        if let Ok(v) = env::var("SYSTEM_FROM_ADDRESS") {
            self.system.from_address.address = v;
        }
        if let Ok(v) = env::var("SYSTEM_TO_ADDRESS") {
            self.system.to_address.address = v;
        }

        self
    }

    fn base(environment: Environment, port: u16, database_url: &str) -> Self {
        Self {
            environment,
            project_name: "Frame".to_string(),
            server: ServerConfig {
                port,
                cors_origins: vec![],
            },
            database: DatabaseConfig {
                url: database_url.to_string(),
                max_connections: 10,
                connection_timeout: 30,
                auto_migrate: true,
            },
            auth: AuthConfig {
                attempts_for_ip: 50,
                attempts_for_ip_and_user: 7,
                bcrypt_cost: 10,
                reset_token_ttl_ms: 10_000_000,
                realm: "frame".to_string(),
            },
            pagination: PaginationConfig {
                default_limit: 20,
                max_limit: 1000,
            },
            mailer: MailerConfig {
                smtp_host: None,
                smtp_port: 465,
                smtp_secure: true,
                smtp_username: None,
                smtp_password: None,
            },
            system: SystemConfig {
                from_address: EmailAddress {
                    name: "Frame".to_string(),
                    address: "system@example.com".to_string(),
                },
                to_address: EmailAddress {
                    name: "Frame".to_string(),
                    address: "system@example.com".to_string(),
                },
            },
        }
    }

    fn development() -> Self {
        let mut config = Self::base(Environment::Development, 9000, "postgres://localhost:5432/frame");
        config.server.cors_origins = vec!["http://localhost:9000".to_string()];
        config
    }

    fn test() -> Self {
        let mut config = Self::base(Environment::Test, 9090, "postgres://localhost:5432/frame_test");
        // Cheap hashes keep the suite fast
        config.auth.bcrypt_cost = 4;
        config
    }

    fn production() -> Self {
        let mut config = Self::base(Environment::Production, 8080, "postgres://localhost:5432/frame");
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.auto_migrate = false;
        config.pagination.max_limit = 100;
        config.mailer.smtp_host = Some("smtp.gmail.com".to_string());
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.attempts_for_ip, 50);
        assert_eq!(config.auth.attempts_for_ip_and_user, 7);
        assert!(config.mailer.smtp_host.is_none());
        assert!(config.database.auto_migrate);
    }

    #[test]
    fn test_profile_uses_cheap_hashing() {
        let config = AppConfig::test();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert!(config.database.url.ends_with("/frame_test"));
    }

    #[test]
    fn production_defaults() {
        let config = AppConfig::production();
        assert!(!config.database.auto_migrate);
        assert_eq!(config.pagination.max_limit, 100);
        assert!(config.mailer.smtp_secure);
        assert_eq!(config.mailer.smtp_host.as_deref(), Some("smtp.gmail.com"));
    }
}
