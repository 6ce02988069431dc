//! Rate-governed Kafka publisher for synthetic log records.
//!
//! This crate provides the pieces the `kafka-log-stream` binary wires
//! together: topic provisioning, an asynchronous record sink backed by
//! rdkafka, delivery reporting, and the [`LogPublisher`] loop that paces
//! emission to a target rate.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────┐
//!   startup ───────▶ │  ensure_topic    │  (once, never fatal)
//!                    └──────────────────┘
//!
//! ┌──────────────┐  pull  ┌──────────────────┐  submit  ┌──────────────┐
//! │ LogGenerator │ ◀───── │   LogPublisher   │ ───────▶ │  RecordSink  │
//! └──────────────┘        │                  │  flush   │  (KafkaSink) │
//!                         │ - RunState       │ ───────▶ └──────┬───────┘
//!                         │ - pacing sleep   │                 │ producer thread
//!                         │ - shutdown rx    │                 ▼
//!                         └──────────────────┘       ┌──────────────────┐
//!                                  ▲                 │ DeliveryReporter │
//!                                  └── DeliveryStats ┤ (logs + atomics) │
//!                                                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use log_generator::LogGenerator;
//! use log_stream_kafka::{
//!     provision_topic, DeliveryReporter, DeliveryStats, KafkaSink, LogPublisher,
//!     ProducerSettings, PublishConfig, TopicSpec, DEFAULT_TOPIC_TIMEOUT,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let topic = TopicSpec::new("local-logs-stream", 6, 1);
//!     provision_topic("localhost:9092", &topic, DEFAULT_TOPIC_TIMEOUT).await;
//!
//!     let stats = Arc::new(DeliveryStats::default());
//!     let reporter = Arc::new(DeliveryReporter::new(Arc::clone(&stats)));
//!     let sink = KafkaSink::new(&ProducerSettings::new("localhost:9092"), &topic.name, reporter)?;
//!
//!     let (_tx, rx) = tokio::sync::broadcast::channel(1);
//!     let publisher = LogPublisher::new(sink, LogGenerator::new(), PublishConfig::default(), stats)?;
//!     let summary = publisher.run(rx).await?;
//!     println!("Produced {} records", summary.messages_produced);
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod delivery;
pub mod error;
pub mod publisher;
pub mod sink;
pub mod topic;

// Re-exports for convenience
pub use args::LogStreamArgs;
pub use delivery::{
    DeliveryContext, DeliveryObserver, DeliveryReceipt, DeliveryReporter, DeliveryStats,
};
pub use error::{DeliveryError, FlushError, ProvisionError, PublishError, SubmitError};
pub use publisher::{
    LogPublisher, Phase, PublishConfig, RunState, RunSummary, DEFAULT_FLUSH_TIMEOUT,
    DEFAULT_IDLE_INTERVAL, DEFAULT_REPORT_EVERY,
};
pub use sink::{KafkaSink, OutboundRecord, ProducerSettings, RecordSink, PRODUCER_DEFAULTS};
pub use topic::{
    ensure_topic, provision_topic, KafkaTopicAdmin, TopicAdmin, TopicSpec, TopicStatus,
    DEFAULT_TOPIC_TIMEOUT,
};
