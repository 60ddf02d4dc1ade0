//! Cache backends for the order mirror. See [`crate::traits::OrderCache`] for the contract.
mod errors;
mod redis_cache;

#[cfg(any(feature = "test_utils", test))]
mod memory;

pub use errors::CacheError;
#[cfg(any(feature = "test_utils", test))]
pub use memory::MemoryOrderCache;
pub use redis_cache::{RedisConfig, RedisOrderCache};
