//! Thin wrappers around `async-nats` for the order feed: connecting, provisioning the JetStream stream and the shared
//! durable consumer, and publishing JSON payloads.
mod client;
mod config;
mod error;

pub use client::NatsClient;
pub use config::{ConsumerConfig, NatsConfig};
pub use error::NatsError;

/// Name of the JetStream stream that captures every order subject.
pub const ORDER_STREAM: &str = "ORDERS";
/// Subjects captured by [`ORDER_STREAM`].
pub const ORDER_STREAM_SUBJECTS: &str = "orders.>";
/// New orders are published here.
pub const ORDER_SUBJECT: &str = "orders.new";
/// The durable consumer shared by every gateway instance. Messages are load-balanced across its members.
pub const ORDER_CONSUMER_GROUP: &str = "order-processors";
/// Messages that exhausted their delivery attempts are republished here.
pub const DEAD_LETTER_SUBJECT: &str = "orders.dead";

/// Header carrying the reason a message was dead-lettered.
pub const DEAD_LETTER_REASON_HEADER: &str = "Oig-Dead-Letter-Reason";
/// Header carrying the number of delivery attempts made before the message was dead-lettered.
pub const DEAD_LETTER_ATTEMPTS_HEADER: &str = "Oig-Delivery-Attempts";
/// Header carrying the subject the message was originally published on.
pub const DEAD_LETTER_SUBJECT_HEADER: &str = "Oig-Original-Subject";
