use thiserror::Error;

#[derive(Debug, Error)]
pub enum NatsError {
    #[error("Could not connect to NATS: {0}")]
    Connect(String),
    #[error("Could not provision JetStream stream {stream}: {message}")]
    Stream { stream: String, message: String },
    #[error("Could not provision JetStream consumer {consumer}: {message}")]
    Consumer { consumer: String, message: String },
    #[error("Could not publish to {subject}: {message}")]
    Publish { subject: String, message: String },
    #[error("Could not serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Could not flush the NATS connection: {0}")]
    Flush(String),
}
