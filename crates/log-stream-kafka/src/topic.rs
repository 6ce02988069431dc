//! Topic provisioning.
//!
//! The destination topic is created once at startup. Provisioning is
//! best-effort: the topic may already exist (possibly with other settings) or
//! be managed outside this tool, so no outcome here stops the publisher.

use crate::error::ProvisionError;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{error, info, warn};

/// Default timeout for the create-topic admin operation.
pub const DEFAULT_TOPIC_TIMEOUT: Duration = Duration::from_secs(10);

/// Requested shape of the destination topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

impl TopicSpec {
    pub fn new(name: impl Into<String>, partitions: i32, replication_factor: i32) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
        }
    }
}

/// What [`ensure_topic`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicStatus {
    Created,
    AlreadyExists,
    Failed,
}

/// Administrative access to the broker, limited to creating one topic.
#[async_trait]
pub trait TopicAdmin: Send + Sync {
    /// Create `topic`. Must return [`ProvisionError::AlreadyExists`] when the
    /// broker reports that the topic is already there.
    async fn create_topic(&self, topic: &TopicSpec) -> Result<(), ProvisionError>;
}

/// Create `topic` if absent.
///
/// "Already exists" is logged as a warning, anything else as an error. The
/// returned status is informational only.
pub async fn ensure_topic<A: TopicAdmin + ?Sized>(admin: &A, topic: &TopicSpec) -> TopicStatus {
    info!(
        "Creating topic '{}' with {} partitions and RF {}...",
        topic.name, topic.partitions, topic.replication_factor
    );

    match admin.create_topic(topic).await {
        Ok(()) => {
            info!("Topic '{}' created successfully.", topic.name);
            TopicStatus::Created
        }
        Err(ProvisionError::AlreadyExists(name)) => {
            warn!("Topic '{name}' already exists.");
            TopicStatus::AlreadyExists
        }
        Err(e) => {
            error!("Failed to create topic '{}': {e}", topic.name);
            TopicStatus::Failed
        }
    }
}

/// Connect an admin client to `brokers` and ensure `topic` exists.
///
/// Failing to build the admin client is reported like any other
/// provisioning failure.
pub async fn provision_topic(brokers: &str, topic: &TopicSpec, timeout: Duration) -> TopicStatus {
    match KafkaTopicAdmin::new(brokers, timeout) {
        Ok(admin) => ensure_topic(&admin, topic).await,
        Err(e) => {
            error!("Failed to create topic '{}': {e}", topic.name);
            TopicStatus::Failed
        }
    }
}

/// [`TopicAdmin`] backed by an rdkafka `AdminClient`.
pub struct KafkaTopicAdmin {
    client: AdminClient<DefaultClientContext>,
    timeout: Duration,
}

impl KafkaTopicAdmin {
    pub fn new(brokers: &str, timeout: Duration) -> Result<Self, ProvisionError> {
        let client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .create()?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl TopicAdmin for KafkaTopicAdmin {
    async fn create_topic(&self, topic: &TopicSpec) -> Result<(), ProvisionError> {
        let new_topic = NewTopic::new(
            &topic.name,
            topic.partitions,
            TopicReplication::Fixed(topic.replication_factor),
        );
        // The request timeout also bounds broker lookup, so an unreachable
        // cluster fails within the same limit.
        let opts = AdminOptions::new()
            .operation_timeout(Some(self.timeout))
            .request_timeout(Some(self.timeout));

        let results = self.client.create_topics(&[new_topic], &opts).await?;
        for result in results {
            match result {
                Ok(_) => {}
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    return Err(ProvisionError::AlreadyExists(name));
                }
                Err((name, code)) => {
                    return Err(ProvisionError::Failed {
                        topic: name,
                        reason: code.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
