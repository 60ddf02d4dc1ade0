//! The order aggregate as it travels through the gateway: decoded from broker messages, written to the relational
//! store, and mirrored into the cache.
//!
//! Field names follow the JSON wire format of the order feed (lower snake case). The same structs are used as `sqlx`
//! row types; the sub-entities map one-to-one onto their tables, while the order row skips the owned collections.
use std::{convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     OrderUid       ---------------------------------------------------------
/// The externally assigned, stable identifier of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderUid(String);

impl OrderUid {
    pub fn new<S: Into<String>>(uid: S) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The key under which this order is mirrored in the cache, `order:<order_uid>`.
    pub fn cache_key(&self) -> String {
        format!("order:{}", self.0)
    }
}

impl Display for OrderUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderUid {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderUid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderUid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------       Order        ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Order {
    pub order_uid: OrderUid,
    pub track_number: String,
    pub entry: String,
    #[sqlx(skip)]
    pub delivery: Delivery,
    #[sqlx(skip)]
    pub payment: Payment,
    #[sqlx(skip)]
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    #[serde(rename = "shardkey", alias = "shard_key")]
    pub shard_key: String,
    pub sm_id: i32,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderValidationError {
    #[error("The order has no order_uid")]
    MissingOrderUid,
}

impl Order {
    /// Checks the invariants an order must satisfy before it can be stored.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.order_uid.is_empty() {
            return Err(OrderValidationError::MissingOrderUid);
        }
        Ok(())
    }
}

//--------------------------------------      Delivery      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

//--------------------------------------      Payment       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Unix timestamp (seconds) of the payment
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

//--------------------------------------        Item        ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    /// Discount, in percent
    pub sale: i32,
    pub size: String,
    /// Price after the discount has been applied
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}
