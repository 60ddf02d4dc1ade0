use mockall::mock;
use order_ingest_engine::{
    db_types::{Order, OrderUid},
    InsertOrderResult,
    OrderCache,
    OrderStore,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct MockErr {
    pub message: String,
}

impl MockErr {
    pub fn new(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}

mock! {
    pub OrderStore {}
    impl OrderStore for OrderStore {
        type Error = MockErr;
        async fn create_order(&self, order: &Order) -> Result<InsertOrderResult, MockErr>;
        async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Option<Order>, MockErr>;
    }
}

mock! {
    pub OrderCache {}
    impl OrderCache for OrderCache {
        type Error = MockErr;
        async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Option<Order>, MockErr>;
        async fn store_order(&self, order_uid: &OrderUid, order: &Order) -> Result<(), MockErr>;
        async fn remove_order(&self, order_uid: &OrderUid) -> Result<(), MockErr>;
    }
}
