//! # Backend contracts
//!
//! The order processing flow only sees its collaborators through these traits, so that the relational store and the
//! cache can be swapped for other backends, or for test doubles.
//!
//! * [`OrderStore`] is the durable, authoritative home of an order aggregate.
//! * [`OrderCache`] is a best-effort, TTL-bounded mirror of the store, keyed by order uid. It is never authoritative.
mod data_objects;
mod order_cache;
mod order_store;

pub use data_objects::InsertOrderResult;
pub use order_cache::{OrderCache, ORDER_CACHE_TTL};
pub use order_store::OrderStore;
