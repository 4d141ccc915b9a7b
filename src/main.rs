use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use frame_api::{config, database::DatabaseManager, is_production, mailer, server, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SMTP_HOST, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting {} API in {:?} mode", config.project_name, config.environment);

    let pool = DatabaseManager::connect(&config.database)?;
    if config.database.auto_migrate {
        if let Err(e) = DatabaseManager::migrate(&pool).await {
            tracing::error!("Migrations failed, serving without them: {}", e);
        }
    }

    if is_production!() && config.mailer.smtp_host.is_none() {
        tracing::warn!("No SMTP host configured; outgoing mail will only be logged");
    }
    let mailer = mailer::from_config()?;

    let app = server::app(AppState::new(pool, mailer));

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("{} listening on http://{}", config.project_name, bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
