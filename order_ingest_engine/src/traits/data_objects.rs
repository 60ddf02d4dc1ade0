use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::OrderUid;

/// The outcome of writing an order aggregate to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOrderResult {
    /// The order did not exist before and has been written in full.
    Inserted(OrderUid),
    /// The order row already existed. Its scalar fields are untouched; the owned delivery, payment and item rows were
    /// replaced with those of the submitted aggregate.
    AlreadyExists(OrderUid),
}

impl InsertOrderResult {
    pub fn order_uid(&self) -> &OrderUid {
        match self {
            Self::Inserted(uid) | Self::AlreadyExists(uid) => uid,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

impl Display for InsertOrderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inserted(uid) => write!(f, "order {uid} inserted"),
            Self::AlreadyExists(uid) => write!(f, "order {uid} already existed"),
        }
    }
}
