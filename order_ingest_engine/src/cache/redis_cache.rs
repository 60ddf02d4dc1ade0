use std::fmt::Debug;

use log::*;
use oig_common::Secret;
use redis::{aio::ConnectionManager, Client};

use super::CacheError;
use crate::{
    db_types::{Order, OrderUid},
    traits::{OrderCache, ORDER_CACHE_TTL},
};

#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `host:port` of the Redis server
    pub addr: String,
    pub password: Secret<String>,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self { addr: "localhost:6379".into(), password: Secret::default(), db: 0 }
    }
}

impl RedisConfig {
    pub fn connection_url(&self) -> String {
        let password = self.password.reveal();
        if password.is_empty() {
            format!("redis://{}/{}", self.addr, self.db)
        } else {
            format!("redis://:{}@{}/{}", urlencoding::encode(password), self.addr, self.db)
        }
    }
}

/// An [`OrderCache`] backed by Redis. Orders are stored as JSON strings under `order:<order_uid>`.
///
/// The connection manager reconnects transparently and is cheap to clone, so each call works on its own clone.
#[derive(Clone)]
pub struct RedisOrderCache {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl Debug for RedisOrderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RedisOrderCache (ttl: {}s)", self.ttl_secs)
    }
}

impl RedisOrderCache {
    /// Connects to Redis and verifies the connection with a `PING`.
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.connection_url())?;
        let mut conn = ConnectionManager::new(client).await?;
        let pong = redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        if pong != "PONG" {
            return Err(CacheError::Unavailable(format!("Unexpected reply to PING: {pong}")));
        }
        info!("🧊 Connected to Redis at {} (db {})", config.addr, config.db);
        Ok(Self { conn, ttl_secs: ORDER_CACHE_TTL.as_secs() })
    }

    /// Seconds until the entry for `order_uid` expires. `None` if there is no such entry.
    pub async fn time_to_live(&self, order_uid: &OrderUid) -> Result<Option<i64>, CacheError> {
        let mut conn = self.conn.clone();
        let ttl = redis::cmd("TTL").arg(order_uid.cache_key()).query_async::<_, i64>(&mut conn).await?;
        Ok((ttl >= 0).then_some(ttl))
    }
}

impl OrderCache for RedisOrderCache {
    type Error = CacheError;

    async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.conn.clone();
        let data = redis::cmd("GET").arg(order_uid.cache_key()).query_async::<_, Option<Vec<u8>>>(&mut conn).await?;
        match data {
            Some(bytes) => {
                let order = serde_json::from_slice::<Order>(&bytes)?;
                trace!("🧊 Cache hit for order {order_uid}");
                Ok(Some(order))
            },
            None => {
                trace!("🧊 Cache miss for order {order_uid}");
                Ok(None)
            },
        }
    }

    async fn store_order(&self, order_uid: &OrderUid, order: &Order) -> Result<(), Self::Error> {
        let data = serde_json::to_vec(order)?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(order_uid.cache_key())
            .arg(data)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!("🧊 Order {order_uid} saved to cache");
        Ok(())
    }

    async fn remove_order(&self, order_uid: &OrderUid) -> Result<(), Self::Error> {
        let mut conn = self.conn.clone();
        let removed = redis::cmd("DEL").arg(order_uid.cache_key()).query_async::<_, i64>(&mut conn).await?;
        debug!("🧊 Removed {removed} cache entries for order {order_uid}");
        Ok(())
    }
}
