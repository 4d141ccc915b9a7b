use sqlx::PgPool;
use std::sync::Arc;

use crate::mailer::Mailer;

/// Shared handles every handler receives
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(pool: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self { pool, mailer }
    }
}
