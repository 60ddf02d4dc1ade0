use std::time::Duration;

use crate::db_types::{Order, OrderUid};

/// Every cache entry expires this long after it was last written.
pub const ORDER_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A best-effort acceleration layer over the [`crate::traits::OrderStore`].
///
/// A miss is not an error, and the absence of an entry never implies that the order does not exist. Keys are
/// independent; no cross-key consistency is offered.
#[allow(async_fn_in_trait)]
pub trait OrderCache {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the cached order, or `None` if there is no live entry for `order_uid`. Errors are reserved for
    /// transport and deserialization failures.
    async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Option<Order>, Self::Error>;

    /// Stores the order with a TTL of [`ORDER_CACHE_TTL`], overwriting any previous entry.
    async fn store_order(&self, order_uid: &OrderUid, order: &Order) -> Result<(), Self::Error>;

    /// Removes the entry for `order_uid`, if there is one.
    async fn remove_order(&self, order_uid: &OrderUid) -> Result<(), Self::Error>;
}
