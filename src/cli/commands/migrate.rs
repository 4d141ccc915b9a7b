use anyhow::Context;

use crate::config::config;
use crate::database::DatabaseManager;

pub async fn handle() -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config().database)?;
    DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
    println!("Migrations applied");
    Ok(())
}
