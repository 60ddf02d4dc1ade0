mod db;
mod errors;

pub mod orders;

use std::time::Duration;

pub use db::PostgresDatabase;
pub use errors::{PostgresDatabaseError, ReadStage, WriteStage};
use log::*;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Connection pool limits. The pool is shared by every concurrent message handler; each order write holds one
/// connection for the duration of its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 5,
            idle_timeout: Duration::from_secs(30 * 60),
            max_lifetime: Duration::from_secs(60 * 60),
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

pub async fn new_pool(url: &str, settings: PoolSettings) -> Result<PgPool, PostgresDatabaseError> {
    debug!("🗃️ Creating connection pool. {settings:?}");
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .idle_timeout(settings.idle_timeout)
        .max_lifetime(settings.max_lifetime)
        .acquire_timeout(settings.acquire_timeout)
        .connect(url)
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}
