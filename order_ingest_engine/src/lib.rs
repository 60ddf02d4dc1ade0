//! Order Ingest Engine
//!
//! The core of the order ingest gateway. Orders arrive from a message broker, are written to a relational store, and
//! are mirrored into a cache. This library holds everything except the broker and HTTP plumbing:
//!
//! 1. The order aggregate ([`mod@db_types`]), shared by the wire format, the database rows and the cache entries.
//! 2. The backend contracts ([`mod@traits`]): [`OrderStore`] for durable persistence and [`OrderCache`] for the
//!    best-effort mirror.
//! 3. The backends: [`PostgresDatabase`] and [`RedisOrderCache`]. In-memory variants are available with the
//!    `test_utils` feature.
//! 4. The processing service ([`OrderFlowApi`]), which decides what is fatal when a backend fails.
pub mod cache;
pub mod db;
pub mod db_types;
pub mod helpers;
pub mod traits;

mod oig_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use cache::{CacheError, RedisConfig, RedisOrderCache};
#[cfg(any(feature = "test_utils", test))]
pub use cache::MemoryOrderCache;
#[cfg(any(feature = "test_utils", test))]
pub use db::memory::{MemoryDatabase, MemoryDatabaseError};
pub use db::postgres::{PoolSettings, PostgresDatabase, PostgresDatabaseError};
pub use oig_api::{OrderFlowApi, OrderFlowError};
pub use traits::{InsertOrderResult, OrderCache, OrderStore, ORDER_CACHE_TTL};
