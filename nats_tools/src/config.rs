use std::time::Duration;

use log::*;
use oig_common::{env_or_default, EnvVarError};

use crate::{ORDER_CONSUMER_GROUP, ORDER_SUBJECT};

const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub url: String,
    /// Client name reported to the server
    pub name: String,
    pub connect_timeout: Duration,
    pub max_reconnects: usize,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_NATS_URL.into(),
            name: "order-ingest-gateway".into(),
            connect_timeout: Duration::from_secs(10),
            max_reconnects: 5,
        }
    }
}

impl NatsConfig {
    /// Reads `NATS_URL` from the environment, falling back to the default for anything that is not set.
    pub fn from_env_or_default() -> Self {
        let url = std::env::var("NATS_URL").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            info!("🪛️ NATS_URL is not set. Using the default, {DEFAULT_NATS_URL}.");
            DEFAULT_NATS_URL.to_string()
        });
        Self { url, ..Default::default() }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }
}

/// Settings of the durable pull consumer that feeds orders to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub durable_name: String,
    pub filter_subject: String,
    /// The gateway dead-letters a message that fails on this attempt. The broker itself redelivers without limit, so
    /// that a message whose dead letter could not be published is not lost.
    pub max_deliveries: i64,
    /// How long the broker waits for an acknowledgement before redelivering.
    pub ack_wait: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            durable_name: ORDER_CONSUMER_GROUP.into(),
            filter_subject: ORDER_SUBJECT.into(),
            max_deliveries: 5,
            ack_wait: Duration::from_secs(30),
        }
    }
}

impl ConsumerConfig {
    /// Reads `ORDERS_MAX_DELIVERIES` and `ORDERS_ACK_WAIT_SECS` from the environment.
    pub fn try_from_env() -> Result<Self, EnvVarError> {
        let defaults = Self::default();
        let max_deliveries = env_or_default("ORDERS_MAX_DELIVERIES", defaults.max_deliveries)?;
        if max_deliveries < 1 {
            return Err(EnvVarError {
                name: "ORDERS_MAX_DELIVERIES".into(),
                value: max_deliveries.to_string(),
                reason: "At least one delivery attempt is required".into(),
            });
        }
        let ack_wait = env_or_default("ORDERS_ACK_WAIT_SECS", defaults.ack_wait.as_secs())?;
        Ok(Self { max_deliveries, ack_wait: Duration::from_secs(ack_wait), ..defaults })
    }
}
