//! Error types for the log stream publisher.

use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use thiserror::Error;

/// Errors from the one-shot topic provisioning call.
///
/// None of these abort the process; [`ensure_topic`](crate::topic::ensure_topic)
/// logs them and moves on.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Topic '{0}' already exists")]
    AlreadyExists(String),

    #[error("Failed to create topic '{topic}': {reason}")]
    Failed { topic: String, reason: String },

    #[error("Kafka admin error: {0}")]
    Kafka(#[from] KafkaError),
}

/// A submission the producer refused to enqueue.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Producer queue is full")]
    QueueFull,

    #[error("Producer rejected record: {0}")]
    Rejected(#[source] KafkaError),

    #[error("Producer is in a fatal state: {0}")]
    Fatal(#[source] KafkaError),
}

impl SubmitError {
    /// Fatal errors leave the producer unusable and end the publish loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SubmitError::Fatal(_))
    }
}

impl From<KafkaError> for SubmitError {
    fn from(err: KafkaError) -> Self {
        match err.rdkafka_error_code() {
            Some(RDKafkaErrorCode::QueueFull) => SubmitError::QueueFull,
            Some(RDKafkaErrorCode::Fatal) => SubmitError::Fatal(err),
            _ => SubmitError::Rejected(err),
        }
    }
}

/// A flush that did not drain the producer queue.
#[derive(Error, Debug)]
pub enum FlushError {
    #[error("Flush did not complete: {0}")]
    Kafka(#[from] KafkaError),

    #[error("Flush task failed: {0}")]
    Task(String),
}

/// Negative acknowledgement reported by the delivery callback.
#[derive(Error, Debug, Clone)]
pub enum DeliveryError {
    #[error("{0}")]
    Kafka(#[from] KafkaError),
}

/// Errors that end a publish run.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to serialize log record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Submission failed: {0}")]
    Submit(#[from] SubmitError),
}
