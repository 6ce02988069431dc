//! CLI argument definitions for the log stream publisher.
//!
//! Every flag can also be supplied through the environment variable named
//! next to it, so the binary can be configured entirely from a container
//! environment.

use crate::error::PublishError;
use crate::publisher::PublishConfig;
use crate::sink::ProducerSettings;
use crate::topic::TopicSpec;
use clap::Args;
use std::time::Duration;

/// Kafka log stream arguments.
#[derive(Args, Clone, Debug)]
pub struct LogStreamArgs {
    /// Kafka brokers (comma-separated, e.g., "localhost:9092")
    #[arg(long, env = "KAFKA_BROKERS", default_value = "localhost:9092")]
    pub kafka_brokers: String,

    /// Topic to publish log records to
    #[arg(long, env = "KAFKA_TOPIC", default_value = "local-logs-stream")]
    pub kafka_topic: String,

    /// Partition count used when the topic has to be created
    #[arg(long, env = "NUM_PARTITIONS", default_value_t = 6)]
    pub num_partitions: i32,

    /// Replication factor used when the topic has to be created
    #[arg(long, env = "REPLICATION_FACTOR", default_value_t = 1)]
    pub replication_factor: i32,

    /// Number of records to produce before going idle
    #[arg(long, env = "TOTAL_LOGS", default_value_t = 100)]
    pub total_logs: u64,

    /// Target emission rate in records per second
    #[arg(long, env = "LOG_RATE", default_value_t = 50)]
    pub log_rate: u32,

    /// Log progress and flush every N records
    #[arg(long, env = "REPORT_EVERY", default_value_t = 5_000)]
    pub report_every: u64,

    /// Seconds to sleep between idle checks after the limit is reached
    #[arg(long = "idle-interval", env = "IDLE_INTERVAL_SECS", default_value_t = 5)]
    pub idle_interval_secs: u64,

    /// Upper bound in seconds for each producer flush
    #[arg(long = "flush-timeout", env = "FLUSH_TIMEOUT_SECS", default_value_t = 30)]
    pub flush_timeout_secs: u64,

    /// Timeout in seconds for the create-topic request
    #[arg(long = "topic-timeout", env = "TOPIC_TIMEOUT_SECS", default_value_t = 10)]
    pub topic_timeout_secs: u64,

    /// Random seed for reproducible record contents (default: OS entropy)
    #[arg(long, env = "LOG_SEED")]
    pub seed: Option<u64>,

    /// Compression codec (none, gzip, snappy, lz4, zstd)
    #[arg(long, env = "KAFKA_COMPRESSION", default_value = "lz4")]
    pub compression: String,

    /// Extra librdkafka producer property, may be repeated
    #[arg(long = "producer-property", value_name = "KEY=VALUE", value_parser = parse_property)]
    pub producer_properties: Vec<(String, String)>,
}

impl LogStreamArgs {
    pub fn validate(&self) -> Result<(), PublishError> {
        if self.num_partitions < 1 {
            return Err(PublishError::InvalidConfig(format!(
                "partition count must be at least 1, got {}",
                self.num_partitions
            )));
        }
        if self.replication_factor < 1 {
            return Err(PublishError::InvalidConfig(format!(
                "replication factor must be at least 1, got {}",
                self.replication_factor
            )));
        }
        self.publish_config().validate()
    }

    pub fn topic_spec(&self) -> TopicSpec {
        TopicSpec::new(
            self.kafka_topic.clone(),
            self.num_partitions,
            self.replication_factor,
        )
    }

    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig {
            total_logs: self.total_logs,
            log_rate: self.log_rate,
            report_every: self.report_every,
            idle_interval: Duration::from_secs(self.idle_interval_secs),
            flush_timeout: Duration::from_secs(self.flush_timeout_secs),
        }
    }

    pub fn producer_settings(&self) -> ProducerSettings {
        self.producer_properties.iter().fold(
            ProducerSettings::new(self.kafka_brokers.clone()).with_compression(&self.compression),
            |settings, (key, value)| settings.with_property(key, value),
        )
    }

    pub fn topic_timeout(&self) -> Duration {
        Duration::from_secs(self.topic_timeout_secs)
    }
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty property name in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
