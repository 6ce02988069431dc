//! Asynchronous record submission.
//!
//! A [`RecordSink`] enqueues records without waiting for the broker and
//! drains its queue on [`RecordSink::flush`]. The Kafka implementation wraps an
//! rdkafka `ThreadedProducer`, whose background thread handles batching,
//! compression, retries and delivery callbacks.

use crate::delivery::{DeliveryContext, DeliveryObserver};
use crate::error::{FlushError, SubmitError};
use async_trait::async_trait;
use rdkafka::error::KafkaError;
use rdkafka::producer::{BaseRecord, Producer, ThreadedProducer};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Producer tuning applied unless overridden.
pub const PRODUCER_DEFAULTS: [(&str, &str); 7] = [
    ("queue.buffering.max.messages", "200000"),
    ("queue.buffering.max.ms", "100"),
    ("batch.num.messages", "10000"),
    ("compression.type", "lz4"),
    ("message.send.max.retries", "3"),
    ("reconnect.backoff.ms", "100"),
    ("reconnect.backoff.max.ms", "3600000"),
];

/// One serialized record on its way to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    /// Identifier reported back by the delivery callback.
    pub id: String,
    pub payload: Vec<u8>,
}

impl OutboundRecord {
    pub fn new(id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// Non-blocking submit plus blocking flush.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Enqueue `record` and return immediately.
    fn submit(&self, record: OutboundRecord) -> Result<(), SubmitError>;

    /// Wait until every enqueued record is acknowledged or failed, or until
    /// `timeout` elapses.
    async fn flush(&self, timeout: Duration) -> Result<(), FlushError>;
}

#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    fn submit(&self, record: OutboundRecord) -> Result<(), SubmitError> {
        (**self).submit(record)
    }

    async fn flush(&self, timeout: Duration) -> Result<(), FlushError> {
        (**self).flush(timeout).await
    }
}

/// Connection and tuning settings for the Kafka producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerSettings {
    pub brokers: String,
    properties: Vec<(String, String)>,
}

impl ProducerSettings {
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            properties: PRODUCER_DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Set a librdkafka property, replacing any earlier value for `key`.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.properties.push((key, value)),
        }
        self
    }

    pub fn with_compression(self, codec: impl Into<String>) -> Self {
        self.with_property("compression.type", codec)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.brokers);
        for (key, value) in &self.properties {
            config.set(key, value);
        }
        config
    }
}

/// [`RecordSink`] publishing to a single Kafka topic.
///
/// Records are sent without a key so the producer's default partitioner
/// spreads them across partitions.
pub struct KafkaSink {
    producer: Arc<ThreadedProducer<DeliveryContext>>,
    topic: String,
}

impl KafkaSink {
    pub fn new(
        settings: &ProducerSettings,
        topic: impl Into<String>,
        observer: Arc<dyn DeliveryObserver>,
    ) -> Result<Self, KafkaError> {
        let producer: ThreadedProducer<DeliveryContext> = settings
            .client_config()
            .create_with_context(DeliveryContext::new(observer))?;

        Ok(Self {
            producer: Arc::new(producer),
            topic: topic.into(),
        })
    }
}

#[async_trait]
impl RecordSink for KafkaSink {
    fn submit(&self, record: OutboundRecord) -> Result<(), SubmitError> {
        let OutboundRecord { id, payload } = record;
        let base: BaseRecord<'_, (), [u8], Box<String>> =
            BaseRecord::with_opaque_to(&self.topic, Box::new(id)).payload(&payload[..]);

        self.producer.send(base).map_err(|(err, _)| SubmitError::from(err))
    }

    async fn flush(&self, timeout: Duration) -> Result<(), FlushError> {
        let producer = Arc::clone(&self.producer);
        debug!("Flushing {} queued records", producer.in_flight_count());

        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| FlushError::Task(e.to_string()))??;

        Ok(())
    }
}
