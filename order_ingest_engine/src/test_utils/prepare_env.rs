use std::env;

use log::*;
use sqlx::migrate;

use crate::{db_types::OrderUid, PostgresDatabase};

/// Environment variable holding the URL of a disposable Postgres database for integration tests.
pub const TEST_DATABASE_URL: &str = "OIG_TEST_DATABASE_URL";
/// Environment variable holding the address (`host:port`) of a disposable Redis instance for integration tests.
pub const TEST_REDIS_ADDR: &str = "OIG_TEST_REDIS_URL";

/// Loads `.env.test` and initialises logging. Returns the value of `var`, or `None` (with a log line) when the
/// backing service is not configured and the test should be skipped.
pub fn test_service_url(var: &str) -> Option<String> {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    match env::var(var) {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ => {
            warn!("🚀️ {var} is not set. Skipping this test.");
            None
        },
    }
}

/// Connects to the test database and applies the schema.
pub async fn prepare_test_db(url: &str) -> PostgresDatabase {
    let db = PostgresDatabase::new_with_url(url).await.expect("Error creating connection to database");
    run_migrations(&db).await;
    debug!("🚀️ Test database is ready");
    db
}

/// Removes the order and, through the cascading foreign keys, all of its sub-rows. Tests share one database, so each
/// test clears only the orders it uses.
pub async fn delete_order(db: &PostgresDatabase, order_uid: &OrderUid) {
    sqlx::query("DELETE FROM orders WHERE order_uid = $1")
        .bind(order_uid)
        .execute(db.pool())
        .await
        .expect("Error deleting test order");
}

pub async fn run_migrations(db: &PostgresDatabase) {
    migrate!("./src/db/postgres/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}
