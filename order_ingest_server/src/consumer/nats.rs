use std::{fmt::Debug, pin::Pin, time::Duration};

use async_nats::{
    jetstream::{consumer::pull, AckKind, Message},
    HeaderMap,
};
use bytes::Bytes;
use futures::StreamExt;
use log::*;
use nats_tools::{
    ConsumerConfig,
    NatsClient,
    NatsError,
    DEAD_LETTER_ATTEMPTS_HEADER,
    DEAD_LETTER_REASON_HEADER,
    DEAD_LETTER_SUBJECT,
    DEAD_LETTER_SUBJECT_HEADER,
};

use super::broker::{BrokerError, DeadLetter, InboundMessage, MessageBroker, OrderSubscription};

/// [`MessageBroker`] backed by a JetStream durable pull consumer.
#[derive(Clone)]
pub struct NatsBroker {
    client: NatsClient,
    config: ConsumerConfig,
}

impl Debug for NatsBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NatsBroker ({})", self.config.durable_name)
    }
}

impl NatsBroker {
    pub fn new(client: NatsClient, config: ConsumerConfig) -> Self {
        Self { client, config }
    }

    /// Creates the order stream and the durable consumer, if they do not exist yet.
    pub async fn provision(&self) -> Result<(), NatsError> {
        self.client.durable_consumer(&self.config).await.map(|_| ())
    }

    pub fn client(&self) -> &NatsClient {
        &self.client
    }
}

impl MessageBroker for NatsBroker {
    type Subscription = NatsSubscription;

    async fn subscribe(&self) -> Result<Self::Subscription, BrokerError> {
        let consumer =
            self.client.durable_consumer(&self.config).await.map_err(|e| BrokerError::Subscribe(e.to_string()))?;
        let messages = consumer.messages().await.map_err(|e| BrokerError::Subscribe(e.to_string()))?;
        info!("📨 Subscribed to {} as {}", self.config.filter_subject, self.config.durable_name);
        Ok(NatsSubscription { messages: Box::pin(messages), name: self.config.durable_name.clone() })
    }

    async fn dead_letter(&self, letter: DeadLetter<'_>) -> Result<(), BrokerError> {
        let mut headers = HeaderMap::new();
        headers.insert(DEAD_LETTER_REASON_HEADER, header_value(letter.reason).as_str());
        headers.insert(DEAD_LETTER_ATTEMPTS_HEADER, letter.attempts.to_string().as_str());
        headers.insert(DEAD_LETTER_SUBJECT_HEADER, letter.subject);
        self.client
            .publish(DEAD_LETTER_SUBJECT, headers, Bytes::copy_from_slice(letter.payload))
            .await
            .map_err(|e| BrokerError::DeadLetter(e.to_string()))
    }
}

/// Header values cannot span lines.
fn header_value(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

pub struct NatsSubscription {
    messages: Pin<Box<pull::Stream>>,
    name: String,
}

impl OrderSubscription for NatsSubscription {
    type Message = NatsMessage;

    async fn next_message(&mut self) -> Option<Result<Self::Message, BrokerError>> {
        let next = self.messages.next().await?;
        Some(next.map(NatsMessage).map_err(|e| BrokerError::Receive(e.to_string())))
    }

    /// Stops pulling. The durable consumer itself is shared with the other gateway instances, so it is left in place.
    async fn unsubscribe(self) -> Result<(), BrokerError> {
        drop(self.messages);
        debug!("📨 Stopped pulling messages for {}", self.name);
        Ok(())
    }
}

pub struct NatsMessage(Message);

impl InboundMessage for NatsMessage {
    fn subject(&self) -> &str {
        self.0.message.subject.as_str()
    }

    fn payload(&self) -> &[u8] {
        &self.0.message.payload
    }

    fn delivery_attempt(&self) -> u64 {
        match self.0.info() {
            Ok(info) => u64::try_from(info.delivered).unwrap_or(1).max(1),
            Err(e) => {
                warn!("📨 Message metadata is unreadable, assuming first delivery. {e}");
                1
            },
        }
    }

    async fn ack(&self) -> Result<(), BrokerError> {
        self.0.ack().await.map_err(|e| BrokerError::Acknowledge(e.to_string()))
    }

    async fn nak(&self, delay: Duration) -> Result<(), BrokerError> {
        let delay = Some(delay).filter(|d| !d.is_zero());
        self.0.ack_with(AckKind::Nak(delay)).await.map_err(|e| BrokerError::Acknowledge(e.to_string()))
    }

    async fn term(&self) -> Result<(), BrokerError> {
        self.0.ack_with(AckKind::Term).await.map_err(|e| BrokerError::Acknowledge(e.to_string()))
    }
}
