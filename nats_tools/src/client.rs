use std::fmt::Debug;

use async_nats::{
    jetstream::{
        self,
        consumer::{pull, AckPolicy, Consumer},
        stream::{Config as StreamConfig, Stream},
    },
    Client,
    ConnectOptions,
    HeaderMap,
};
use bytes::Bytes;
use log::*;
use serde::Serialize;

use crate::{ConsumerConfig, NatsConfig, NatsError, ORDER_STREAM, ORDER_STREAM_SUBJECTS};

/// A connected NATS client together with its JetStream context.
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
    jetstream: jetstream::Context,
}

impl Debug for NatsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NatsClient ({:?})", self.client.connection_state())
    }
}

impl NatsClient {
    pub async fn connect(config: &NatsConfig) -> Result<Self, NatsError> {
        let client = ConnectOptions::new()
            .name(config.name.as_str())
            .connection_timeout(config.connect_timeout)
            .max_reconnects(config.max_reconnects)
            .connect(config.url.as_str())
            .await
            .map_err(|e| NatsError::Connect(e.to_string()))?;
        info!("📨 Connected to NATS at {}", config.url);
        let jetstream = jetstream::new(client.clone());
        Ok(Self { client, jetstream })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    /// Creates the order stream if it does not exist yet, and returns it.
    pub async fn ensure_order_stream(&self) -> Result<Stream, NatsError> {
        let config = StreamConfig {
            name: ORDER_STREAM.to_string(),
            subjects: vec![ORDER_STREAM_SUBJECTS.to_string()],
            ..Default::default()
        };
        let stream = self.jetstream.get_or_create_stream(config).await.map_err(|e| NatsError::Stream {
            stream: ORDER_STREAM.to_string(),
            message: e.to_string(),
        })?;
        debug!("📨 Stream {ORDER_STREAM} is ready");
        Ok(stream)
    }

    /// Binds to the durable pull consumer described by `config`, creating it (and the order stream) if necessary.
    /// Every gateway instance binds to the same consumer, so the broker load-balances messages between them.
    pub async fn durable_consumer(&self, config: &ConsumerConfig) -> Result<Consumer<pull::Config>, NatsError> {
        let stream = self.ensure_order_stream().await?;
        let consumer_config = pull::Config {
            durable_name: Some(config.durable_name.clone()),
            filter_subject: config.filter_subject.clone(),
            ack_policy: AckPolicy::Explicit,
            ack_wait: config.ack_wait,
            // The gateway counts attempts itself. A message stays deliverable until it has been dead-lettered.
            max_deliver: -1,
            ..Default::default()
        };
        let consumer = stream
            .get_or_create_consumer(config.durable_name.as_str(), consumer_config)
            .await
            .map_err(|e| NatsError::Consumer { consumer: config.durable_name.clone(), message: e.to_string() })?;
        debug!("📨 Bound to durable consumer {} on {}", config.durable_name, config.filter_subject);
        Ok(consumer)
    }

    /// Serializes `value` as JSON and publishes it to `subject`, waiting for the stream to acknowledge it.
    pub async fn publish_json<T: Serialize>(&self, subject: &str, value: &T) -> Result<(), NatsError> {
        let payload = serde_json::to_vec(value)?;
        self.publish(subject, HeaderMap::new(), Bytes::from(payload)).await
    }

    /// Publishes a raw payload with headers to `subject`, waiting for the stream to acknowledge it.
    pub async fn publish(&self, subject: &str, headers: HeaderMap, payload: Bytes) -> Result<(), NatsError> {
        let publish_err =
            |e: &dyn std::fmt::Display| NatsError::Publish { subject: subject.to_string(), message: e.to_string() };
        let ack = self
            .jetstream
            .publish_with_headers(subject.to_string(), headers, payload)
            .await
            .map_err(|e| publish_err(&e))?;
        let ack = ack.await.map_err(|e| publish_err(&e))?;
        trace!("📨 Published to {subject}. Stream {} sequence {}", ack.stream, ack.sequence);
        Ok(())
    }

    pub async fn flush(&self) -> Result<(), NatsError> {
        self.client.flush().await.map_err(|e| NatsError::Flush(e.to_string()))
    }
}
