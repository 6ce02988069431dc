//! Command-line interface for kafka-log-stream
//!
//! Publishes synthetic JSON log records to a Kafka topic at a steady rate
//! until interrupted.
//!
//! # Usage Examples
//!
//! ```bash
//! # Defaults: localhost:9092, topic local-logs-stream, 100 records at 50/s
//! kafka-log-stream
//!
//! # Configured from the environment
//! KAFKA_BROKERS=kafka:9092 TOTAL_LOGS=1000000 LOG_RATE=2000 kafka-log-stream
//!
//! # Flags take precedence over the environment; extra producer tuning
//! kafka-log-stream --kafka-topic demo-logs --total-logs 10 --log-rate 1000 \
//!   --producer-property acks=all
//! ```
//!
//! After the record limit is reached the process keeps running idle and
//! reports the final count about once a minute. Stop it with Ctrl+C or
//! SIGTERM; buffered records are flushed before exit.

use anyhow::Context;
use clap::Parser;
use log_generator::LogGenerator;
use log_stream_kafka::{
    provision_topic, DeliveryReporter, DeliveryStats, KafkaSink, LogPublisher, LogStreamArgs,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "kafka-log-stream")]
#[command(about = "Publish synthetic JSON log records to a Kafka topic at a steady rate")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    args: LogStreamArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Cli::parse().args;
    args.validate()?;

    info!("Starting continuous log producer...");
    provision_topic(&args.kafka_brokers, &args.topic_spec(), args.topic_timeout()).await;
    info!(
        "Broker: {}, Topic: {}, Rate: {} logs/sec",
        args.kafka_brokers, args.kafka_topic, args.log_rate
    );

    let stats = Arc::new(DeliveryStats::default());
    let reporter = Arc::new(DeliveryReporter::new(Arc::clone(&stats)));
    let sink = KafkaSink::new(&args.producer_settings(), &args.kafka_topic, reporter)
        .with_context(|| format!("Failed to create Kafka producer for {}", args.kafka_brokers))?;

    let generator = match args.seed {
        Some(seed) => {
            info!("Using fixed seed {seed} for record contents");
            LogGenerator::with_seed(seed)
        }
        None => LogGenerator::new(),
    };

    let publisher = LogPublisher::new(sink, generator, args.publish_config(), stats)?;

    let shutdown = setup_shutdown_handler();
    let summary = publisher.run(shutdown).await?;

    info!(
        "Log producer stopped after {} records ({} delivered)",
        summary.messages_produced, summary.delivered
    );
    Ok(())
}

/// Sets up a shutdown signal handler
fn setup_shutdown_handler() -> broadcast::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                warn!("Received {signal}, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                // Keep the sender alive: without a handler only a hard kill stops the process.
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    });

    shutdown_rx
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "interrupt signal (Ctrl+C)"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("interrupt signal (Ctrl+C)")
}
