//! An in-process [`OrderStore`] for tests. It follows the same write semantics as the Postgres backend, and can be
//! told to fail every write.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        RwLock,
    },
};

use log::*;
use thiserror::Error;

use crate::{
    db_types::{Order, OrderUid},
    traits::{InsertOrderResult, OrderStore},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MemoryDatabaseError {
    #[error("Simulated write failure for order {0}")]
    WriteFailed(OrderUid),
    #[error("The in-memory store lock is poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    orders: Arc<RwLock<HashMap<OrderUid, Order>>>,
    fail_writes: Arc<AtomicBool>,
    fail_next: Arc<AtomicUsize>,
    write_calls: Arc<AtomicUsize>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every subsequent `create_order` call fails and leaves the store untouched.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The next `count` calls to `create_order` fail. Calls after that succeed, unless `set_fail_writes` is on.
    pub fn fail_next_writes(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// The number of `create_order` calls received, successful or not.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.orders.read().map(|o| o.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderStore for MemoryDatabase {
    type Error = MemoryDatabaseError;

    async fn create_order(&self, order: &Order) -> Result<InsertOrderResult, Self::Error> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let uid = order.order_uid.clone();
        let fail_once = self.fail_next.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
        if fail_once || self.fail_writes.load(Ordering::SeqCst) {
            return Err(MemoryDatabaseError::WriteFailed(uid));
        }
        let mut orders = self.orders.write().map_err(|_| MemoryDatabaseError::Poisoned)?;
        let result = match orders.get_mut(&uid) {
            Some(existing) => {
                existing.delivery = order.delivery.clone();
                existing.payment = order.payment.clone();
                existing.items = order.items.clone();
                InsertOrderResult::AlreadyExists(uid)
            },
            None => {
                orders.insert(uid.clone(), order.clone());
                InsertOrderResult::Inserted(uid)
            },
        };
        trace!("🗃️ [memory] {result}");
        Ok(result)
    }

    async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Option<Order>, Self::Error> {
        let orders = self.orders.read().map_err(|_| MemoryDatabaseError::Poisoned)?;
        Ok(orders.get(order_uid).cloned())
    }
}
