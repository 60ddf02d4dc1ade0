use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use log::*;
use tokio::time::Instant;

use super::CacheError;
use crate::{
    db_types::{Order, OrderUid},
    traits::{OrderCache, ORDER_CACHE_TTL},
};

/// An in-process [`OrderCache`] for tests. Entries are stored as JSON, like the Redis backend, and expire after the
/// configured TTL. In failing mode, every call returns [`CacheError::Unavailable`].
#[derive(Debug, Clone)]
pub struct MemoryOrderCache {
    entries: Arc<Mutex<HashMap<String, (Instant, Vec<u8>)>>>,
    ttl: Duration,
    failing: Arc<AtomicBool>,
}

impl Default for MemoryOrderCache {
    fn default() -> Self {
        Self::with_ttl(ORDER_CACHE_TTL)
    }
}

impl MemoryOrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { entries: Arc::default(), ttl, failing: Arc::default() }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Whether a live entry exists for `order_uid`. Ignores failing mode.
    pub fn contains(&self, order_uid: &OrderUid) -> bool {
        self.live_entry(&order_uid.cache_key()).is_some()
    }

    /// The raw JSON stored for `order_uid`, if the entry is live. Ignores failing mode.
    pub fn raw_entry(&self, order_uid: &OrderUid) -> Option<Vec<u8>> {
        self.live_entry(&order_uid.cache_key())
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory cache is in failing mode".into()));
        }
        Ok(())
    }

    fn live_entry(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((written, data)) if written.elapsed() < self.ttl => Some(data.clone()),
            Some(_) => {
                trace!("🧊 [memory] Entry {key} has expired");
                entries.remove(key);
                None
            },
            None => None,
        }
    }
}

impl OrderCache for MemoryOrderCache {
    type Error = CacheError;

    async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Option<Order>, Self::Error> {
        self.check_available()?;
        match self.live_entry(&order_uid.cache_key()) {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    async fn store_order(&self, order_uid: &OrderUid, order: &Order) -> Result<(), Self::Error> {
        self.check_available()?;
        let data = serde_json::to_vec(order)?;
        let mut entries = self.entries.lock().map_err(|e| CacheError::Unavailable(e.to_string()))?;
        entries.insert(order_uid.cache_key(), (Instant::now(), data));
        Ok(())
    }

    async fn remove_order(&self, order_uid: &OrderUid) -> Result<(), Self::Error> {
        self.check_available()?;
        let mut entries = self.entries.lock().map_err(|e| CacheError::Unavailable(e.to_string()))?;
        entries.remove(&order_uid.cache_key());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::helpers::sample_order;

    #[tokio::test]
    async fn miss_is_not_an_error() {
        let cache = MemoryOrderCache::new();
        let uid = OrderUid::from("nope");
        assert!(cache.fetch_order(&uid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_fetch_and_remove() {
        let cache = MemoryOrderCache::new();
        let order = sample_order(3);
        let uid = order.order_uid.clone();
        cache.store_order(&uid, &order).await.unwrap();
        assert_eq!(cache.fetch_order(&uid).await.unwrap(), Some(order));
        cache.remove_order(&uid).await.unwrap();
        assert!(cache.fetch_order(&uid).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryOrderCache::with_ttl(Duration::from_secs(60));
        let order = sample_order(4);
        cache.store_order(&order.order_uid, &order).await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.contains(&order.order_uid));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.fetch_order(&order.order_uid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_mode() {
        let cache = MemoryOrderCache::new();
        cache.set_failing(true);
        let order = sample_order(5);
        let err = cache.store_order(&order.order_uid, &order).await.unwrap_err();
        assert!(matches!(err, CacheError::Unavailable(_)));
        assert!(!cache.contains(&order.order_uid));
    }
}
