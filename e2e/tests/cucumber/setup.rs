use bytes::Bytes;
use futures_util::StreamExt;
use log::*;
use nats_tools::{
    NatsClient,
    DEAD_LETTER_ATTEMPTS_HEADER,
    DEAD_LETTER_REASON_HEADER,
    DEAD_LETTER_SUBJECT,
    DEAD_LETTER_SUBJECT_HEADER,
    ORDER_SUBJECT,
};
use order_ingest_engine::{db_types::Order, helpers::sample_order};

use crate::cucumber::{world::STEP_TIMEOUT, OigWorld};

/// A payload that is not an order at all.
pub const MALFORMED_ORDER: &str = r#"{"order_uid": "b563feb7b2b84b6broken", "items": "#;

/// A dead-lettered message as seen by an observer of the dead-letter subject.
#[derive(Debug, Clone)]
pub struct ObservedDeadLetter {
    pub payload: Bytes,
    pub reason: String,
    pub attempts: u64,
    pub original_subject: String,
}

pub async fn publish_sample_order(nats: &NatsClient, index: u32) -> Order {
    let order = sample_order(index);
    nats.publish_json(ORDER_SUBJECT, &order).await.expect("Error publishing order");
    debug!("🌍️ Published sample order {}", order.order_uid);
    order
}

pub async fn publish_raw(nats: &NatsClient, payload: &'static str) {
    nats.publish(ORDER_SUBJECT, Default::default(), Bytes::from_static(payload.as_bytes()))
        .await
        .expect("Error publishing raw payload");
}

impl OigWorld {
    /// Starts listening on the dead-letter subject. Must be called before the failing message is published.
    pub async fn watch_dead_letters(&mut self) {
        let subscriber =
            self.nats().client().subscribe(DEAD_LETTER_SUBJECT).await.expect("Error subscribing to dead letters");
        self.dead_letters = Some(subscriber);
    }

    pub async fn next_dead_letter(&mut self) -> ObservedDeadLetter {
        let subscriber = self.dead_letters.as_mut().expect("Not watching dead letters");
        let message = tokio::time::timeout(STEP_TIMEOUT, subscriber.next())
            .await
            .expect("No dead letter arrived in time")
            .expect("Dead-letter subscription closed");
        let headers = message.headers.clone().unwrap_or_default();
        let header = |name: &str| headers.get(name).map(|v| v.as_str().to_string()).unwrap_or_default();
        ObservedDeadLetter {
            payload: message.payload.clone(),
            reason: header(DEAD_LETTER_REASON_HEADER),
            attempts: header(DEAD_LETTER_ATTEMPTS_HEADER).parse().unwrap_or_default(),
            original_subject: header(DEAD_LETTER_SUBJECT_HEADER),
        }
    }
}
