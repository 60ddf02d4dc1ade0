use thiserror::Error;

use crate::db_types::{OrderUid, OrderValidationError};

#[derive(Debug, Error)]
pub enum OrderFlowError<E: std::error::Error + 'static> {
    #[error("The order was rejected: {0}")]
    InvalidOrder(#[from] OrderValidationError),
    #[error("Order store error: {0}")]
    StoreError(#[source] E),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderUid),
    #[error("Order cache error: {0}")]
    CacheError(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl<E: std::error::Error + 'static> OrderFlowError<E> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OrderNotFound(_))
    }
}
