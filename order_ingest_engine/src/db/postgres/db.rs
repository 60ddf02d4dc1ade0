use std::fmt::Debug;

use log::*;
use sqlx::PgPool;

use super::{new_pool, orders, PoolSettings, PostgresDatabaseError, WriteStage};
use crate::{
    db_types::{Order, OrderUid},
    traits::{InsertOrderResult, OrderStore},
};

#[derive(Clone)]
pub struct PostgresDatabase {
    url: String,
    pool: PgPool,
}

impl Debug for PostgresDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PostgresDatabase ({:?})", self.pool)
    }
}

impl PostgresDatabase {
    /// Connects to the database at `url` with the default pool settings.
    pub async fn new_with_url(url: &str) -> Result<Self, PostgresDatabaseError> {
        Self::new_with_settings(url, PoolSettings::default()).await
    }

    pub async fn new_with_settings(url: &str, settings: PoolSettings) -> Result<Self, PostgresDatabaseError> {
        let pool = new_pool(url, settings).await?;
        info!("🗃️ Connected to Postgres with a pool of at most {} connections", settings.max_connections);
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl OrderStore for PostgresDatabase {
    type Error = PostgresDatabaseError;

    /// Writes the order aggregate in a single transaction. Dropping the transaction on any error rolls it back.
    async fn create_order(&self, order: &Order) -> Result<InsertOrderResult, Self::Error> {
        let uid = &order.order_uid;
        let mut tx = self.pool.begin().await.map_err(PostgresDatabaseError::write(uid, WriteStage::Begin))?;
        let result = orders::write_order(order, &mut tx).await?;
        tx.commit().await.map_err(PostgresDatabaseError::write(uid, WriteStage::Commit))?;
        debug!("🗃️ Transaction for order {uid} committed. {result}");
        Ok(result)
    }

    async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_uid, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.pool.close().await;
        info!("🗃️ Postgres connection pool closed");
        Ok(())
    }
}
