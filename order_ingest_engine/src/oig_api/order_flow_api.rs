use std::fmt::Debug;

use log::*;

use super::OrderFlowError;
use crate::{
    db_types::{Order, OrderUid},
    traits::{InsertOrderResult, OrderCache, OrderStore},
};

/// `OrderFlowApi` runs the "persist, then cache" flow for incoming orders, and the read-through lookup for queries.
///
/// The store is authoritative and every store failure is returned to the caller. The cache is best-effort: its
/// failures are logged and otherwise ignored.
pub struct OrderFlowApi<S, C> {
    store: S,
    cache: C,
}

impl<S, C> Debug for OrderFlowApi<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<S, C> OrderFlowApi<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<S, C> OrderFlowApi<S, C>
where
    S: OrderStore,
    C: OrderCache,
{
    /// Persists the order aggregate, then mirrors it into the cache.
    ///
    /// If the store write fails, the cache is not touched and the error is returned. A cache failure after a
    /// successful write does not fail the call; the entry is repopulated by the next [`Self::fetch_order`].
    pub async fn process_order(&self, order: &Order) -> Result<InsertOrderResult, OrderFlowError<S::Error>> {
        order.validate()?;
        let uid = &order.order_uid;
        let result = self.store.create_order(order).await.map_err(|e| {
            error!("🔄️📦️ Could not save order {uid}. {e}");
            OrderFlowError::StoreError(e)
        })?;
        trace!("🔄️📦️ {result}");
        if result.is_new() {
            if let Err(e) = self.cache.store_order(uid, order).await {
                warn!("🔄️🧊 Order {uid} was saved, but could not be cached. {e}");
            }
        } else {
            self.cache_stored_order(uid).await;
        }
        debug!("🔄️📦️ Order {uid} processing complete ({} items)", order.items.len());
        Ok(result)
    }

    /// Mirrors whatever the store now holds for `uid`. The header of a resubmitted order is never overwritten, so the
    /// submitted copy may differ from the stored one. If the stored aggregate cannot be read, the cache entry is
    /// dropped and the next lookup repopulates it.
    async fn cache_stored_order(&self, uid: &OrderUid) {
        let cached = match self.store.fetch_order(uid).await {
            Ok(Some(stored)) => self.cache.store_order(uid, &stored).await,
            Ok(None) => {
                warn!("🔄️📦️ Order {uid} was reported as existing, but the store does not have it");
                self.cache.remove_order(uid).await
            },
            Err(e) => {
                warn!("🔄️📦️ Could not re-read order {uid} after resubmission. {e}");
                self.cache.remove_order(uid).await
            },
        };
        if let Err(e) = cached {
            warn!("🔄️🧊 Cache entry for resubmitted order {uid} could not be refreshed. {e}");
        }
    }

    /// Looks the order up in the cache, falling back to the store on a miss or a cache error. Orders found in the
    /// store are written back to the cache.
    pub async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Order, OrderFlowError<S::Error>> {
        match self.cache.fetch_order(order_uid).await {
            Ok(Some(order)) => {
                trace!("🔄️🧊 Order {order_uid} served from cache");
                return Ok(order);
            },
            Ok(None) => trace!("🔄️🧊 Order {order_uid} is not cached"),
            Err(e) => warn!("🔄️🧊 Cache lookup for order {order_uid} failed. Falling back to the store. {e}"),
        }
        let order = self
            .store
            .fetch_order(order_uid)
            .await
            .map_err(OrderFlowError::StoreError)?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_uid.clone()))?;
        if let Err(e) = self.cache.store_order(order_uid, &order).await {
            warn!("🔄️🧊 Could not repopulate the cache for order {order_uid}. {e}");
        }
        Ok(order)
    }

    /// Drops the cached copy of the order. The stored order is unaffected.
    pub async fn evict_order(&self, order_uid: &OrderUid) -> Result<(), OrderFlowError<S::Error>> {
        self.cache.remove_order(order_uid).await.map_err(|e| OrderFlowError::CacheError(Box::new(e)))?;
        info!("🔄️🧊 Order {order_uid} evicted from the cache");
        Ok(())
    }
}
