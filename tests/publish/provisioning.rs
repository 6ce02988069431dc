use crate::support::{config, publisher, MemoryAdmin, MemorySink, UnreachableAdmin};
use log_stream_kafka::{ensure_topic, DeliveryStats, TopicSpec, TopicStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_publishing_proceeds_when_topic_exists() {
    let admin = MemoryAdmin::with_topic("local-logs-stream");
    let topic = TopicSpec::new("local-logs-stream", 6, 1);
    assert_eq!(ensure_topic(&admin, &topic).await, TopicStatus::AlreadyExists);

    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(10, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(1)).await;
    tx.send(()).unwrap();
    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.messages_produced, 10);
}

#[tokio::test(start_paused = true)]
async fn test_publishing_proceeds_when_provisioning_fails() {
    let topic = TopicSpec::new("local-logs-stream", 6, 1);
    assert_eq!(ensure_topic(&UnreachableAdmin, &topic).await, TopicStatus::Failed);

    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(3, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(1)).await;
    tx.send(()).unwrap();
    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.messages_produced, 3);
}
