use crate::{
    db_types::{Order, OrderUid},
    traits::InsertOrderResult,
};

/// Durable, relational persistence of the order aggregate.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    type Error: std::error::Error + 'static;

    /// Writes the order, its delivery, its payment and all of its items in a single atomic unit of work.
    ///
    /// The write is idempotent for the whole aggregate: if the order row already exists, its scalar fields are left
    /// as they are, and the owned rows are replaced rather than duplicated. Either everything becomes visible, or
    /// nothing does.
    async fn create_order(&self, order: &Order) -> Result<InsertOrderResult, Self::Error>;

    /// Reconstructs the full order aggregate for the given uid.
    ///
    /// Returns `None` if the order row does not exist. Missing delivery or payment rows are tolerated and left at
    /// their default values; an order without items has an empty item list.
    async fn fetch_order(&self, order_uid: &OrderUid) -> Result<Option<Order>, Self::Error>;

    /// Releases the resources held by the store.
    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
