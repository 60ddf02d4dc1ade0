//! # Order consumer
//!
//! Pulls order messages from the broker, hands them to the [`OrderFlowApi`] and settles each delivery:
//!
//! * The order was decoded and persisted: the message is acknowledged.
//! * Decoding or persistence failed on an attempt below the delivery limit: the message is negatively acknowledged,
//!   and the broker redelivers it after a delay that doubles with every attempt.
//! * The last allowed attempt failed: the raw payload is republished to the dead-letter subject and the message is
//!   terminated. If the dead letter cannot be published, the message is left unacknowledged, and the broker
//!   redelivers it once the ack window elapses.
//!
//! Cache failures never reach the consumer; the [`OrderFlowApi`] swallows them.
pub mod broker;
pub mod nats;

#[cfg(any(feature = "test_utils", test))]
pub mod memory;

use std::{fmt::Display, time::Duration};

use futures::{stream, StreamExt};
use log::*;
use order_ingest_engine::{db_types::Order, OrderCache, OrderFlowApi, OrderStore};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use self::broker::{BrokerError, DeadLetter, InboundMessage, MessageBroker, OrderSubscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Created,
    Subscribed,
    Running,
    Unsubscribing,
    Stopped,
}

impl Display for ConsumerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Subscribed => "subscribed",
            Self::Running => "running",
            Self::Unsubscribing => "unsubscribing",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ConsumerError {
    #[error("The order consumer could not subscribe. {0}")]
    SubscribeFailed(#[source] BrokerError),
}

/// Redelivery delays never grow beyond this.
pub const MAX_REDELIVERY_DELAY: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerOptions {
    /// Upper bound on the number of messages handled concurrently
    pub max_in_flight: usize,
    /// The delivery attempt on which a failing message is dead-lettered instead of retried
    pub max_deliveries: u64,
    /// Redelivery delay after a failed first attempt. It doubles on every further attempt.
    pub retry_backoff: Duration,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self { max_in_flight: 16, max_deliveries: 5, retry_backoff: Duration::from_secs(1) }
    }
}

impl ConsumerOptions {
    /// How long the broker should wait before redelivering a message that failed on `attempt`.
    pub fn redelivery_delay(&self, attempt: u64) -> Duration {
        let doublings = attempt.saturating_sub(1).min(31) as u32;
        self.retry_backoff.saturating_mul(1u32 << doublings).min(MAX_REDELIVERY_DELAY)
    }
}

/// How a single delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Acknowledged,
    Retrying,
    DeadLettered,
    /// The message could not be settled and will be redelivered once the broker's ack window elapses
    Unsettled,
}

pub struct OrderConsumer<B, S, C> {
    broker: B,
    api: OrderFlowApi<S, C>,
    options: ConsumerOptions,
    state: watch::Sender<ConsumerState>,
}

impl<B, S, C> OrderConsumer<B, S, C> {
    pub fn new(broker: B, api: OrderFlowApi<S, C>, options: ConsumerOptions) -> Self {
        let (state, _) = watch::channel(ConsumerState::Created);
        Self { broker, api, options, state }
    }

    /// A receiver that follows the consumer's lifecycle.
    pub fn state(&self) -> watch::Receiver<ConsumerState> {
        self.state.subscribe()
    }

    pub fn api(&self) -> &OrderFlowApi<S, C> {
        &self.api
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    fn set_state(&self, state: ConsumerState) {
        let previous = self.state.send_replace(state);
        trace!("📨 Consumer state: {previous} -> {state}");
    }
}

impl<B, S, C> OrderConsumer<B, S, C>
where
    B: MessageBroker,
    S: OrderStore,
    C: OrderCache,
{
    /// Subscribes and processes messages until `shutdown` is cancelled. In-flight messages are allowed to finish
    /// before the subscription is released.
    pub async fn start(&self, shutdown: CancellationToken) -> Result<(), ConsumerError> {
        let mut subscription = match self.broker.subscribe().await {
            Ok(s) => s,
            Err(e) => {
                error!("📨 Could not subscribe to the order feed. {e}");
                self.set_state(ConsumerState::Stopped);
                return Err(ConsumerError::SubscribeFailed(e));
            },
        };
        self.set_state(ConsumerState::Subscribed);
        info!("📨 Order consumer is running with up to {} messages in flight", self.options.max_in_flight);
        self.set_state(ConsumerState::Running);

        let max_in_flight = self.options.max_in_flight.max(1);
        stream::unfold(&mut subscription, |sub| async move { sub.next_message().await.map(|next| (next, sub)) })
            .take_until(shutdown.cancelled())
            .for_each_concurrent(max_in_flight, |next| async move {
                match next {
                    Ok(message) => {
                        self.handle_message(message).await;
                    },
                    Err(e) => warn!("📨 Error receiving message. {e}"),
                }
            })
            .await;

        info!("📨 Order consumer is shutting down");
        self.set_state(ConsumerState::Unsubscribing);
        if let Err(e) = subscription.unsubscribe().await {
            warn!("📨 Error while unsubscribing. {e}");
        }
        self.set_state(ConsumerState::Stopped);
        info!("📨 Order consumer stopped");
        Ok(())
    }

    /// Decodes and processes one delivery, then settles it with the broker.
    pub async fn handle_message<M: InboundMessage>(&self, message: M) -> MessageOutcome {
        let attempt = message.delivery_attempt();
        let result = match serde_json::from_slice::<Order>(message.payload()) {
            Ok(order) => match self.api.process_order(&order).await {
                Ok(result) => {
                    debug!("📨 Message on {} processed: {result}", message.subject());
                    Ok(())
                },
                Err(e) => Err(format!("Could not process order {}. {e}", order.order_uid)),
            },
            Err(e) => Err(format!("Could not decode order. {e}")),
        };
        match result {
            Ok(()) => match message.ack().await {
                Ok(()) => MessageOutcome::Acknowledged,
                Err(e) => {
                    warn!("📨 Order was processed, but the message could not be acknowledged. {e}");
                    MessageOutcome::Unsettled
                },
            },
            Err(reason) if attempt >= self.options.max_deliveries => self.dead_letter(&message, &reason).await,
            Err(reason) => {
                let max = self.options.max_deliveries;
                let delay = self.options.redelivery_delay(attempt);
                warn!("📨 {reason} (attempt {attempt} of {max}). The message will be redelivered in {delay:?}.");
                match message.nak(delay).await {
                    Ok(()) => MessageOutcome::Retrying,
                    Err(e) => {
                        warn!("📨 Could not negatively acknowledge the message. {e}");
                        MessageOutcome::Unsettled
                    },
                }
            },
        }
    }

    async fn dead_letter<M: InboundMessage>(&self, message: &M, reason: &str) -> MessageOutcome {
        let letter = DeadLetter {
            subject: message.subject(),
            payload: message.payload(),
            reason,
            attempts: message.delivery_attempt(),
        };
        error!("📨 Giving up on {letter}");
        if let Err(e) = self.broker.dead_letter(letter).await {
            error!("📨 Could not dead-letter the message. It is left unacknowledged. {e}");
            return MessageOutcome::Unsettled;
        }
        match message.term().await {
            Ok(()) => MessageOutcome::DeadLettered,
            Err(e) => {
                warn!("📨 Message was dead-lettered, but could not be terminated. {e}");
                MessageOutcome::Unsettled
            },
        }
    }
}
