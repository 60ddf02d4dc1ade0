//! The broker seam. [`super::OrderConsumer`] only talks to the message broker through these traits.
use std::{fmt::Display, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Could not subscribe: {0}")]
    Subscribe(String),
    #[error("Could not receive message: {0}")]
    Receive(String),
    #[error("Could not acknowledge message: {0}")]
    Acknowledge(String),
    #[error("Could not publish dead letter: {0}")]
    DeadLetter(String),
    #[error("Could not unsubscribe: {0}")]
    Unsubscribe(String),
}

/// A message that exhausted its delivery attempts, on its way to the dead-letter subject.
#[derive(Debug, Clone, Copy)]
pub struct DeadLetter<'a> {
    pub subject: &'a str,
    pub payload: &'a [u8],
    pub reason: &'a str,
    pub attempts: u64,
}

impl Display for DeadLetter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} byte message from {} after {} attempts ({})",
            self.payload.len(),
            self.subject,
            self.attempts,
            self.reason
        )
    }
}

/// One delivery of a broker message.
#[allow(async_fn_in_trait)]
pub trait InboundMessage {
    fn subject(&self) -> &str;

    fn payload(&self) -> &[u8];

    /// The 1-based delivery attempt of this message.
    fn delivery_attempt(&self) -> u64;

    /// Positive acknowledgement. The broker will not redeliver the message.
    async fn ack(&self) -> Result<(), BrokerError>;

    /// Negative acknowledgement. The broker redelivers the message once `delay` has elapsed.
    async fn nak(&self, delay: Duration) -> Result<(), BrokerError>;

    /// Tells the broker to stop redelivering the message, without treating it as processed.
    async fn term(&self) -> Result<(), BrokerError>;
}

/// A live subscription to the order subject.
#[allow(async_fn_in_trait)]
pub trait OrderSubscription {
    type Message: InboundMessage;

    /// Waits for the next message. `None` means the subscription has ended.
    async fn next_message(&mut self) -> Option<Result<Self::Message, BrokerError>>;

    async fn unsubscribe(self) -> Result<(), BrokerError>;
}

#[allow(async_fn_in_trait)]
pub trait MessageBroker {
    type Subscription: OrderSubscription;

    /// Joins the shared consumer group on the order subject.
    async fn subscribe(&self) -> Result<Self::Subscription, BrokerError>;

    /// Republishes a message that could not be processed to the dead-letter subject.
    async fn dead_letter(&self, letter: DeadLetter<'_>) -> Result<(), BrokerError>;
}
