use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache transport error: {0}")]
    Transport(#[from] redis::RedisError),
    #[error("Could not (de)serialize the cached order: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("The cache is unavailable: {0}")]
    Unavailable(String),
}
