use std::fmt::Display;

use thiserror::Error;

use crate::db_types::OrderUid;

/// The step of the order write transaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Begin,
    Order,
    ClearPrevious,
    Delivery,
    Payment,
    Item,
    Commit,
}

impl Display for WriteStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WriteStage::Begin => "begin transaction",
            WriteStage::Order => "insert order",
            WriteStage::ClearPrevious => "clear previous order rows",
            WriteStage::Delivery => "insert delivery",
            WriteStage::Payment => "insert payment",
            WriteStage::Item => "insert item",
            WriteStage::Commit => "commit transaction",
        };
        f.write_str(s)
    }
}

/// The lookup of the order read path that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStage {
    Order,
    Delivery,
    Payment,
    Items,
}

impl Display for ReadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReadStage::Order => "query order",
            ReadStage::Delivery => "query delivery",
            ReadStage::Payment => "query payment",
            ReadStage::Items => "query items",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PostgresDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Failed to {stage} for order {order_uid}: {source}")]
    WriteFailed {
        order_uid: OrderUid,
        stage: WriteStage,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to {stage} for order {order_uid}: {source}")]
    ReadFailed {
        order_uid: OrderUid,
        stage: ReadStage,
        #[source]
        source: sqlx::Error,
    },
}

impl PostgresDatabaseError {
    pub fn write(order_uid: &OrderUid, stage: WriteStage) -> impl FnOnce(sqlx::Error) -> Self + '_ {
        move |source| Self::WriteFailed { order_uid: order_uid.clone(), stage, source }
    }

    pub fn read(order_uid: &OrderUid, stage: ReadStage) -> impl FnOnce(sqlx::Error) -> Self + '_ {
        move |source| Self::ReadFailed { order_uid: order_uid.clone(), stage, source }
    }

    /// The write stage that failed, if this error came from the order write path.
    pub fn write_stage(&self) -> Option<WriteStage> {
        match self {
            Self::WriteFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
