//! An in-process [`MessageBroker`] with JetStream-like redelivery, for tests.
//!
//! Like a JetStream consumer without a delivery limit, a naked message comes back after its nak delay, and a message
//! that is dropped without being settled comes back once the ack window has elapsed. Only `ack` and `term` end a
//! message's life.
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use log::*;
use nats_tools::ORDER_SUBJECT;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::broker::{BrokerError, DeadLetter, InboundMessage, MessageBroker, OrderSubscription};

/// What happened to a delivery, as seen by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Acked { sequence: u64, attempt: u64 },
    Naked { sequence: u64, attempt: u64, delay: Duration },
    Termed { sequence: u64, attempt: u64 },
}

/// A message that was routed to the dead-letter subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDeadLetter {
    pub subject: String,
    pub payload: Vec<u8>,
    pub reason: String,
    pub attempts: u64,
}

#[derive(Debug)]
struct BrokerState {
    ack_wait: Duration,
    sender: UnboundedSender<MemoryMessage>,
    receiver: Mutex<Option<UnboundedReceiver<MemoryMessage>>>,
    settlements: Mutex<Vec<Settlement>>,
    dead_letters: Mutex<Vec<RecordedDeadLetter>>,
    next_sequence: Mutex<u64>,
    fail_subscribe: AtomicBool,
    fail_dead_letters: AtomicUsize,
    unsubscribed: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct MemoryBroker {
    state: Arc<BrokerState>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub const DEFAULT_ACK_WAIT: Duration = Duration::from_millis(50);

    pub fn new() -> Self {
        Self::with_ack_wait(Self::DEFAULT_ACK_WAIT)
    }

    /// Unsettled messages are redelivered `ack_wait` after they are dropped.
    pub fn with_ack_wait(ack_wait: Duration) -> Self {
        let (sender, receiver) = unbounded_channel();
        let state = BrokerState {
            ack_wait,
            sender,
            receiver: Mutex::new(Some(receiver)),
            settlements: Mutex::default(),
            dead_letters: Mutex::default(),
            next_sequence: Mutex::new(1),
            fail_subscribe: AtomicBool::new(false),
            fail_dead_letters: AtomicUsize::new(0),
            unsubscribed: AtomicBool::new(false),
        };
        Self { state: Arc::new(state) }
    }

    /// Queues `payload` on the order subject and returns its sequence number.
    pub fn publish<P: Into<Vec<u8>>>(&self, payload: P) -> u64 {
        let message = self.delivery(payload, 1);
        let sequence = message.sequence;
        self.state.enqueue(message);
        sequence
    }

    /// A delivery of `payload` on its `attempt`-th attempt, handed straight to the caller instead of being queued.
    /// It takes part in redelivery like any other message once it is naked or dropped.
    pub fn delivery<P: Into<Vec<u8>>>(&self, payload: P, attempt: u64) -> MemoryMessage {
        let sequence = {
            let mut next = self.state.next_sequence.lock().unwrap_or_else(|e| e.into_inner());
            let sequence = *next;
            *next += 1;
            sequence
        };
        MemoryMessage::new(sequence, ORDER_SUBJECT.to_string(), payload.into(), attempt, Arc::clone(&self.state))
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.state.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// The next `count` dead letters are refused.
    pub fn fail_next_dead_letters(&self, count: usize) {
        self.state.fail_dead_letters.store(count, Ordering::SeqCst);
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        self.state.settlements.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// The settlements recorded for the message with the given sequence number, in order.
    pub fn settlements_for(&self, sequence: u64) -> Vec<Settlement> {
        self.settlements().into_iter().filter(|s| s.sequence() == sequence).collect()
    }

    pub fn dead_letters(&self) -> Vec<RecordedDeadLetter> {
        self.state.dead_letters.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Number of messages that reached a final state, i.e. were acknowledged or terminated.
    pub fn finished_count(&self) -> usize {
        self.settlements().iter().filter(|s| !matches!(s, Settlement::Naked { .. })).count()
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.state.unsubscribed.load(Ordering::SeqCst)
    }
}

impl Settlement {
    pub fn sequence(&self) -> u64 {
        match self {
            Self::Acked { sequence, .. } | Self::Naked { sequence, .. } | Self::Termed { sequence, .. } => *sequence,
        }
    }
}

impl BrokerState {
    fn record(&self, settlement: Settlement) {
        trace!("📨 [memory] {settlement:?}");
        if let Ok(mut s) = self.settlements.lock() {
            s.push(settlement);
        }
    }

    fn enqueue(&self, message: MemoryMessage) {
        if let Err(e) = self.sender.send(message) {
            let message = e.0;
            message.settled.store(true, Ordering::SeqCst);
            warn!("📨 [memory] Receiver has been dropped. Message {} is lost.", message.sequence);
        }
    }

    /// Queues the next attempt of a message after `delay`.
    fn redeliver(self: &Arc<Self>, sequence: u64, subject: String, payload: Vec<u8>, attempt: u64, delay: Duration) {
        let state = Arc::clone(self);
        let requeue = move || {
            let message = MemoryMessage::new(sequence, subject, payload, attempt, Arc::clone(&state));
            state.enqueue(message);
        };
        if delay.is_zero() {
            requeue();
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    requeue();
                });
            },
            Err(_) => warn!("📨 [memory] No runtime to redeliver message {sequence} on. It is lost."),
        }
    }
}

impl MessageBroker for MemoryBroker {
    type Subscription = MemorySubscription;

    async fn subscribe(&self) -> Result<Self::Subscription, BrokerError> {
        if self.state.fail_subscribe.load(Ordering::SeqCst) {
            return Err(BrokerError::Subscribe("memory broker refused the subscription".into()));
        }
        let receiver = self
            .state
            .receiver
            .lock()
            .map_err(|e| BrokerError::Subscribe(e.to_string()))?
            .take()
            .ok_or_else(|| BrokerError::Subscribe("there is already an active subscription".into()))?;
        self.state.unsubscribed.store(false, Ordering::SeqCst);
        Ok(MemorySubscription { receiver, state: Arc::clone(&self.state) })
    }

    async fn dead_letter(&self, letter: DeadLetter<'_>) -> Result<(), BrokerError> {
        let refuse =
            self.state.fail_dead_letters.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
        if refuse {
            return Err(BrokerError::DeadLetter("memory broker refused the dead letter".into()));
        }
        let record = RecordedDeadLetter {
            subject: letter.subject.to_string(),
            payload: letter.payload.to_vec(),
            reason: letter.reason.to_string(),
            attempts: letter.attempts,
        };
        self.state.dead_letters.lock().map_err(|e| BrokerError::DeadLetter(e.to_string()))?.push(record);
        Ok(())
    }
}

pub struct MemorySubscription {
    receiver: UnboundedReceiver<MemoryMessage>,
    state: Arc<BrokerState>,
}

impl OrderSubscription for MemorySubscription {
    type Message = MemoryMessage;

    async fn next_message(&mut self) -> Option<Result<Self::Message, BrokerError>> {
        self.receiver.recv().await.map(Ok)
    }

    /// Hands the queue back to the broker so that a later subscription picks up where this one stopped.
    async fn unsubscribe(self) -> Result<(), BrokerError> {
        let mut slot = self.state.receiver.lock().map_err(|e| BrokerError::Unsubscribe(e.to_string()))?;
        *slot = Some(self.receiver);
        self.state.unsubscribed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryMessage {
    sequence: u64,
    subject: String,
    payload: Vec<u8>,
    attempt: u64,
    settled: AtomicBool,
    state: Arc<BrokerState>,
}

impl MemoryMessage {
    fn new(sequence: u64, subject: String, payload: Vec<u8>, attempt: u64, state: Arc<BrokerState>) -> Self {
        Self { sequence, subject, payload, attempt, settled: AtomicBool::new(false), state }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Marks the message settled. Returns false if it already was.
    fn settle(&self) -> bool {
        !self.settled.swap(true, Ordering::SeqCst)
    }
}

impl Drop for MemoryMessage {
    fn drop(&mut self) {
        if self.settled.load(Ordering::SeqCst) {
            return;
        }
        trace!("📨 [memory] Message {} attempt {} dropped without settlement", self.sequence, self.attempt);
        let subject = std::mem::take(&mut self.subject);
        let payload = std::mem::take(&mut self.payload);
        self.state.redeliver(self.sequence, subject, payload, self.attempt + 1, self.state.ack_wait);
    }
}

impl InboundMessage for MemoryMessage {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn delivery_attempt(&self) -> u64 {
        self.attempt
    }

    async fn ack(&self) -> Result<(), BrokerError> {
        if !self.settle() {
            return Err(BrokerError::Acknowledge(format!("message {} is already settled", self.sequence)));
        }
        self.state.record(Settlement::Acked { sequence: self.sequence, attempt: self.attempt });
        Ok(())
    }

    async fn nak(&self, delay: Duration) -> Result<(), BrokerError> {
        if !self.settle() {
            return Err(BrokerError::Acknowledge(format!("message {} is already settled", self.sequence)));
        }
        self.state.record(Settlement::Naked { sequence: self.sequence, attempt: self.attempt, delay });
        self.state.redeliver(self.sequence, self.subject.clone(), self.payload.clone(), self.attempt + 1, delay);
        Ok(())
    }

    async fn term(&self) -> Result<(), BrokerError> {
        if !self.settle() {
            return Err(BrokerError::Acknowledge(format!("message {} is already settled", self.sequence)));
        }
        self.state.record(Settlement::Termed { sequence: self.sequence, attempt: self.attempt });
        Ok(())
    }
}
