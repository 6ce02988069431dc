use crate::support::{config, publisher, CapturedEvents, MemorySink, SEED};
use log_generator::{LogGenerator, LogRecord};
use log_stream_kafka::{DeliveryStats, PublishConfig, PublishError, SubmitError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

#[tokio::test(start_paused = true)]
async fn test_stops_producing_at_limit_and_idles() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(10, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(1)).await;
    assert_eq!(sink.submitted_count(), 10);
    // One flush on entering the idle state, none yet for shutdown.
    assert_eq!(sink.flushes(), vec![10]);

    tx.send(()).unwrap();
    let summary = handle.await.unwrap().unwrap();

    assert_eq!(summary.messages_produced, 10);
    assert_eq!(summary.submissions_dropped, 0);
    assert!(summary.limit_reached);
    assert_eq!(sink.flushes(), vec![10, 10]);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_submitted_while_idle() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(5, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(600)).await;
    tx.send(()).unwrap();
    let summary = handle.await.unwrap().unwrap();

    assert_eq!(sink.attempts(), 5);
    assert_eq!(summary.messages_produced, 5);
    assert!(summary.total_duration >= Duration::from_secs(600));
}

#[tokio::test(start_paused = true)]
async fn test_zero_limit_goes_straight_to_idle() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(0, 50), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(30)).await;
    tx.send(()).unwrap();
    let summary = handle.await.unwrap().unwrap();

    assert_eq!(sink.attempts(), 0);
    assert!(summary.limit_reached);
    assert_eq!(sink.flushes(), vec![0, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_emission_never_exceeds_target_rate() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(50, 200), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(2)).await;
    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    let submitted = sink.submitted();
    assert_eq!(submitted.len(), 50);

    let pacing = Duration::from_millis(5);
    for pair in submitted.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= pacing);
    }
    let span = submitted[49].0 - submitted[0].0;
    assert!(span >= pacing * 49);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_while_producing_flushes_once() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(1000, 100), Arc::new(DeliveryStats::default())).run(rx),
    );

    // Emissions at 0, 10, ..., 90 ms.
    sleep(Duration::from_millis(95)).await;
    tx.send(()).unwrap();
    let summary = handle.await.unwrap().unwrap();

    assert_eq!(summary.messages_produced, 10);
    assert!(!summary.limit_reached);
    assert_eq!(sink.flushes(), vec![10]);

    // Nothing is submitted after the interrupt.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(sink.attempts(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_shutdown_sender_counts_as_interrupt() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel::<()>(1);
    drop(tx);

    let summary = publisher(&sink, config(100, 50), Arc::new(DeliveryStats::default()))
        .run(rx)
        .await
        .unwrap();

    assert!(summary.messages_produced <= 1);
    assert_eq!(sink.flushes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_flush_every_report_interval() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let config = PublishConfig {
        report_every: 10,
        ..config(25, 1000)
    };
    let handle = tokio::spawn(publisher(&sink, config, Arc::new(DeliveryStats::default())).run(rx));

    sleep(Duration::from_secs(1)).await;
    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    // Two progress flushes, one at the limit, one on the way out.
    assert_eq!(sink.flushes(), vec![10, 20, 25, 25]);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_error_ends_run_after_single_flush() {
    let sink = Arc::new(MemorySink::new().with_fatal_after(3));
    let (_tx, rx) = broadcast::channel(1);

    let result = publisher(&sink, config(100, 1000), Arc::new(DeliveryStats::default()))
        .run(rx)
        .await;

    assert!(matches!(
        result,
        Err(PublishError::Submit(SubmitError::Fatal(_)))
    ));
    assert_eq!(sink.submitted_count(), 3);
    assert_eq!(sink.attempts(), 4);
    assert_eq!(sink.flushes(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_queue_full_drops_record_without_counting_it() {
    let sink = Arc::new(MemorySink::new().with_queue_full_every(3));
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(10, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(1)).await;
    tx.send(()).unwrap();
    let summary = handle.await.unwrap().unwrap();

    // Attempts 3, 6, 9 and 12 were refused; the 14th completed the tenth record.
    assert_eq!(sink.attempts(), 14);
    assert_eq!(summary.messages_produced, 10);
    assert_eq!(summary.submissions_dropped, 4);
    assert_eq!(sink.submitted_count(), 10);
    assert!(summary.limit_reached);
}

#[tokio::test(start_paused = true)]
async fn test_payloads_are_log_records_keyed_by_correlation_id() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(20, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(1)).await;
    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    let mut ids = HashSet::new();
    for (_, record) in sink.submitted() {
        let decoded: LogRecord = serde_json::from_slice(&record.payload).unwrap();
        assert_eq!(decoded.correlation_id.to_string(), record.id);
        assert!(ids.insert(record.id));
    }
    assert_eq!(ids.len(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_seeded_run_matches_generator_sequence() {
    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(5, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    sleep(Duration::from_secs(1)).await;
    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    let expected: Vec<LogRecord> = LogGenerator::with_seed(SEED).take(5).collect();
    let published = sink.submitted();
    assert_eq!(published.len(), expected.len());

    for ((_, outbound), expected) in published.into_iter().zip(expected) {
        let mut actual: LogRecord = serde_json::from_slice(&outbound.payload).unwrap();
        // Ids are never reproduced across runs; timestamps are wall-clock.
        assert_ne!(actual.correlation_id, expected.correlation_id);
        actual.correlation_id = expected.correlation_id;
        actual.timestamp = expected.timestamp;
        assert_eq!(actual, expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_panic_in_loop_still_flushes_once() {
    let sink = Arc::new(MemorySink::new().with_panic_on_attempt(4));
    let (_tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(100, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    let result = handle.await;

    assert!(result.unwrap_err().is_panic());
    assert_eq!(sink.submitted_count(), 3);
    assert_eq!(sink.flushes(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_idle_report_logged_about_once_a_minute() {
    let captured = CapturedEvents::default();
    let subscriber = tracing_subscriber::registry().with(captured.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let sink = Arc::new(MemorySink::new());
    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(
        publisher(&sink, config(3, 1000), Arc::new(DeliveryStats::default())).run(rx),
    );

    // Limit reached at 3 ms; idle checks start at 3 ms, 5.003 s, 10.003 s, ...
    // and only the ones in the first 5 s of a minute report.
    sleep(Duration::from_secs(130)).await;
    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(captured.count(Level::INFO, "Reached TOTAL_LOGS limit of 3"), 1);
    assert_eq!(captured.count(Level::INFO, "Total messages sent: 3"), 3);
    assert_eq!(captured.count(Level::WARN, "Interrupted"), 1);
}
