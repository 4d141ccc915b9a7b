#![allow(dead_code)]

use std::collections::BTreeMap;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use frame_api::database::models::{Admin, Link, Role, User};
use frame_api::database::DatabaseManager;
use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // DATABASE_URL is inherited; without a database the server still starts and /health reports 503
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_frame-api"));
        cmd.env("APP_ENV", "test")
            .env("FRAME_PORT", port.to_string())
            .env_remove("SMTP_HOST")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(server)
}

/// Pool on `DATABASE_URL` with migrations applied, or `None` when no database
/// is configured and database-backed tests should skip
pub async fn database() -> Result<Option<PgPool>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return Ok(None);
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .context("failed to connect to DATABASE_URL")?;
    DatabaseManager::migrate(&pool).await?;
    Ok(Some(pool))
}

/// Lowercase name unlikely to collide with earlier runs against the same database
pub fn unique(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..12])
}

/// A user created through `POST /api/signup`
pub struct SignedUp {
    pub username: String,
    pub email: String,
    pub password: String,
    pub user_id: String,
    pub account_id: String,
    pub session_id: String,
    pub auth_header: String,
}

pub async fn signup(server: &TestServer, prefix: &str) -> Result<SignedUp> {
    let username = unique(prefix);
    let email = format!("{}@frame.test", username);
    let password = "log-log-log".to_string();

    let res = reqwest::Client::new()
        .post(server.url("/api/signup"))
        .json(&json!({
            "name": "Stimpson J Cat",
            "email": email,
            "username": username,
            "password": password,
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "signup returned {}", res.status());

    let body = res.json::<Value>().await?;
    let data = &body["data"];
    let text = |value: &Value| value.as_str().map(str::to_string).context("missing field in signup reply");

    Ok(SignedUp {
        user_id: text(&data["user"]["_id"])?,
        account_id: text(&data["user"]["roles"]["account"]["id"])?,
        session_id: text(&data["session"]["_id"])?,
        auth_header: text(&data["authHeader"])?,
        username,
        email,
        password,
    })
}

/// `Authorization` header from a successful `POST /api/login`
pub async fn login(server: &TestServer, username: &str, password: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/api/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login returned {}", res.status());

    let body = res.json::<Value>().await?;
    body["data"]["authHeader"]
        .as_str()
        .map(str::to_string)
        .context("login reply has no authHeader")
}

/// A fresh user linked to an admin in the `root` group, logged in
pub async fn root_admin(server: &TestServer, pool: &PgPool) -> Result<String> {
    let username = unique("root");
    let password = "happy-happy-joy-joy";

    let groups = BTreeMap::from([("root".to_string(), "Root".to_string())]);
    let admin = Admin::create_with_groups(pool, "Root Admin", &groups).await?;
    let user = User::create(pool, &username, password, &format!("{}@frame.test", username)).await?;

    let user_link = Link {
        id: user.id.clone(),
        name: user.username.clone(),
    };
    let admin_link = Link {
        id: admin.id.clone(),
        name: admin.full_name(),
    };
    Admin::link_user(pool, &admin.id, &user_link).await?;
    User::link_role(pool, &user.id, Role::Admin, &admin_link).await?;

    login(server, &username, password).await
}
