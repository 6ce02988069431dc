//! Delivery acknowledgement handling.
//!
//! The producer reports the outcome of every accepted record on its own
//! polling thread. Observers only log and count; they never feed back into
//! the publish loop's [`RunState`](crate::publisher::RunState).

use crate::error::DeliveryError;
use rdkafka::message::Message;
use rdkafka::producer::{DeliveryResult, ProducerContext};
use rdkafka::ClientContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Delivery counters shared between the producer thread and the publish loop.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryStats {
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Where the broker placed an acknowledged record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Receives the outcome of each submitted record.
///
/// Called from the producer's thread, concurrently with the publish loop and
/// in no particular order. Implementations must not panic.
pub trait DeliveryObserver: Send + Sync {
    fn on_delivery(&self, record_id: &str, outcome: Result<DeliveryReceipt, DeliveryError>);
}

/// Observer that logs every outcome and keeps [`DeliveryStats`].
#[derive(Debug, Clone, Default)]
pub struct DeliveryReporter {
    stats: Arc<DeliveryStats>,
}

impl DeliveryReporter {
    pub fn new(stats: Arc<DeliveryStats>) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &Arc<DeliveryStats> {
        &self.stats
    }
}

impl DeliveryObserver for DeliveryReporter {
    fn on_delivery(&self, record_id: &str, outcome: Result<DeliveryReceipt, DeliveryError>) {
        match outcome {
            Ok(receipt) => {
                self.stats.record_delivered();
                debug!(
                    "Message {record_id} delivered to {} [{}] at offset {}",
                    receipt.topic, receipt.partition, receipt.offset
                );
            }
            Err(err) => {
                self.stats.record_failed();
                error!("Delivery failed for message {record_id}: {err}");
            }
        }
    }
}

/// rdkafka producer context forwarding delivery reports to an observer.
///
/// Each record is sent with its correlation id as the delivery opaque so a
/// failure can name the record it belongs to.
#[derive(Clone)]
pub struct DeliveryContext {
    observer: Arc<dyn DeliveryObserver>,
}

impl DeliveryContext {
    pub fn new(observer: Arc<dyn DeliveryObserver>) -> Self {
        Self { observer }
    }
}

impl ClientContext for DeliveryContext {}

impl ProducerContext for DeliveryContext {
    type DeliveryOpaque = Box<String>;

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, record_id: Self::DeliveryOpaque) {
        let outcome = match delivery_result {
            Ok(message) => Ok(DeliveryReceipt {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
            }),
            Err((err, _)) => Err(DeliveryError::Kafka(err.clone())),
        };
        self.observer.on_delivery(&record_id, outcome);
    }
}
