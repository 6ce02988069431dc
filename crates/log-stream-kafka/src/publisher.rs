//! Rate-governed publish loop.
//!
//! The loop runs in three phases:
//!
//! ```text
//!   Warming ──(messages_produced == total_logs)──▶ LimitReached
//!      │                                               │
//!      └──────────(interrupt / fatal error)────────────┴──▶ Terminated
//! ```
//!
//! While warming, each iteration generates one record, submits it to the
//! sink, reports progress every `report_every` records and then sleeps
//! `1 / log_rate` seconds. The sleep does not account for the time the
//! iteration itself took, so the achieved rate never exceeds the target but
//! may fall below it. Once the count limit is hit the loop flushes and idles
//! until it is interrupted. Every exit path ends with exactly one flush, a
//! panic inside the loop included.

use crate::delivery::DeliveryStats;
use crate::error::PublishError;
use crate::sink::{OutboundRecord, RecordSink};
use futures::FutureExt;
use log_generator::LogGenerator;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

/// Default number of records between progress reports.
pub const DEFAULT_REPORT_EVERY: u64 = 5_000;

/// Default sleep between idle checks once the limit is reached.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound for a single flush.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Period of the coarse idle-state count report.
const IDLE_REPORT_PERIOD_SECS: f64 = 60.0;

/// Tunables of a publish run.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishConfig {
    /// Records to produce before going idle.
    pub total_logs: u64,
    /// Target emission rate in records per second.
    pub log_rate: u32,
    pub report_every: u64,
    pub idle_interval: Duration,
    pub flush_timeout: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            total_logs: 100,
            log_rate: 50,
            report_every: DEFAULT_REPORT_EVERY,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl PublishConfig {
    pub fn validate(&self) -> Result<(), PublishError> {
        if self.log_rate == 0 {
            return Err(PublishError::InvalidConfig(
                "log rate must be greater than 0".to_string(),
            ));
        }
        if self.report_every == 0 {
            return Err(PublishError::InvalidConfig(
                "report interval must be greater than 0".to_string(),
            ));
        }
        if self.idle_interval.is_zero() {
            return Err(PublishError::InvalidConfig(
                "idle interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Sleep between two emissions.
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.log_rate))
    }
}

/// Phase of the publish loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warming,
    LimitReached,
    Terminated,
}

/// Counters and timers owned by the publish loop.
#[derive(Debug, Clone)]
pub struct RunState {
    messages_produced: u64,
    submissions_dropped: u64,
    run_start_time: Instant,
    current_batch_start_time: Instant,
    limit_reached_at: Option<Instant>,
    phase: Phase,
}

impl RunState {
    pub fn new(now: Instant) -> Self {
        Self {
            messages_produced: 0,
            submissions_dropped: 0,
            run_start_time: now,
            current_batch_start_time: now,
            limit_reached_at: None,
            phase: Phase::Warming,
        }
    }

    pub fn messages_produced(&self) -> u64 {
        self.messages_produced
    }

    pub fn submissions_dropped(&self) -> u64 {
        self.submissions_dropped
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// When the count limit was hit, if it was.
    pub fn limit_reached_at(&self) -> Option<Instant> {
        self.limit_reached_at
    }

    pub fn run_elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.run_start_time)
    }

    pub fn batch_elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.current_batch_start_time)
    }

    fn record_submission(&mut self) {
        self.messages_produced += 1;
    }

    fn record_drop(&mut self) {
        self.submissions_dropped += 1;
    }

    fn start_batch(&mut self, now: Instant) {
        self.current_batch_start_time = now;
    }

    /// Leave `Warming` for `LimitReached`. There is no way back.
    fn reach_limit(&mut self, now: Instant) {
        if self.phase == Phase::Warming {
            self.phase = Phase::LimitReached;
            self.limit_reached_at = Some(now);
        }
    }

    fn terminate(&mut self) {
        self.phase = Phase::Terminated;
    }
}

/// Outcome of a publish run that ended on interrupt.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub messages_produced: u64,
    pub submissions_dropped: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
    /// Whether the count limit had been reached before the interrupt.
    pub limit_reached: bool,
    pub total_duration: Duration,
}

impl RunSummary {
    pub fn messages_per_second(&self) -> f64 {
        throughput(self.messages_produced, self.total_duration)
    }
}

/// Records per second over `elapsed`, zero when no time has passed.
pub fn throughput(count: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        count as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

/// Coarse gate for the idle-state report: true during the first
/// `idle_interval` of every minute of run time.
pub fn idle_report_due(run_elapsed: Duration, idle_interval: Duration) -> bool {
    run_elapsed.as_secs_f64() % IDLE_REPORT_PERIOD_SECS < idle_interval.as_secs_f64()
}

/// Publishes generated log records to a [`RecordSink`] at a steady rate.
pub struct LogPublisher<S: RecordSink> {
    sink: S,
    generator: LogGenerator,
    config: PublishConfig,
    delivery: Arc<DeliveryStats>,
}

impl<S: RecordSink> LogPublisher<S> {
    pub fn new(
        sink: S,
        generator: LogGenerator,
        config: PublishConfig,
        delivery: Arc<DeliveryStats>,
    ) -> Result<Self, PublishError> {
        config.validate()?;
        Ok(Self {
            sink,
            generator,
            config,
            delivery,
        })
    }

    /// Run until a message arrives on `shutdown` (or its sender is dropped)
    /// or a fatal error occurs.
    ///
    /// The sink is flushed exactly once on the way out, whichever way the run
    /// ends. A fatal error is returned after that flush; a panic in the loop
    /// is resumed after it.
    pub async fn run(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<RunSummary, PublishError> {
        let mut state = RunState::new(Instant::now());
        info!(
            "Publishing up to {} records at {} logs/sec",
            self.config.total_logs, self.config.log_rate
        );

        let driven = AssertUnwindSafe(self.drive(&mut state, &mut shutdown))
            .catch_unwind()
            .await;

        let outcome = match driven {
            Ok(outcome) => outcome,
            Err(panic) => {
                state.terminate();
                error!("Publish loop panicked! Flushing remaining messages...");
                self.final_flush().await;
                std::panic::resume_unwind(panic);
            }
        };

        match &outcome {
            Ok(()) => warn!("Interrupted! Flushing remaining messages..."),
            Err(e) => error!("An error occurred: {e}"),
        }
        self.final_flush().await;

        outcome?;

        let summary = RunSummary {
            messages_produced: state.messages_produced(),
            submissions_dropped: state.submissions_dropped(),
            delivered: self.delivery.delivered(),
            delivery_failures: self.delivery.failed(),
            limit_reached: state.limit_reached_at().is_some(),
            total_duration: state.run_elapsed(Instant::now()),
        };
        info!(
            "Produced {} records in {:.2}s ({:.2} msg/sec), {} delivered, {} failed, {} dropped",
            summary.messages_produced,
            summary.total_duration.as_secs_f64(),
            summary.messages_per_second(),
            summary.delivered,
            summary.delivery_failures,
            summary.submissions_dropped
        );

        Ok(summary)
    }

    async fn final_flush(&self) {
        info!("Flushing producer...");
        if let Err(e) = self.sink.flush(self.config.flush_timeout).await {
            error!("Final flush failed, some records may be lost: {e}");
        }
    }

    /// Main loop. Leaves `state` in `Terminated` and returns `Ok(())` on
    /// interrupt.
    async fn drive(
        &mut self,
        state: &mut RunState,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<(), PublishError> {
        let pacing = self.config.pacing_interval();
        let idle_interval = self.config.idle_interval;

        loop {
            match state.phase() {
                Phase::Warming => {
                    if state.messages_produced() >= self.config.total_logs {
                        self.enter_limit_reached(state).await;
                        continue;
                    }

                    let accepted = match self.emit_one(state) {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            state.terminate();
                            return Err(e);
                        }
                    };
                    if accepted && state.messages_produced() % self.config.report_every == 0 {
                        self.report_progress(state).await;
                    }

                    tokio::select! {
                        _ = shutdown.recv() => state.terminate(),
                        _ = sleep(pacing) => {}
                    }
                }
                Phase::LimitReached => {
                    let run_elapsed = state.run_elapsed(Instant::now());

                    tokio::select! {
                        _ = shutdown.recv() => {
                            state.terminate();
                            continue;
                        }
                        _ = sleep(idle_interval) => {}
                    }

                    if idle_report_due(run_elapsed, idle_interval) {
                        info!("Total messages sent: {}", state.messages_produced());
                    }
                }
                Phase::Terminated => return Ok(()),
            }
        }
    }

    /// Generate, serialize and submit one record.
    ///
    /// Returns whether the sink accepted it. Rejected records are dropped.
    fn emit_one(&mut self, state: &mut RunState) -> Result<bool, PublishError> {
        let record = self.generator.generate();
        let payload = record.to_json_bytes()?;
        let outbound = OutboundRecord::new(record.correlation_id.to_string(), payload);

        match self.sink.submit(outbound) {
            Ok(()) => {
                state.record_submission();
                Ok(true)
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                state.record_drop();
                warn!("Dropping record {}: {e}", record.correlation_id);
                Ok(false)
            }
        }
    }

    async fn report_progress(&self, state: &mut RunState) {
        let now = Instant::now();
        let batch_elapsed = state.batch_elapsed(now);
        let total_elapsed = state.run_elapsed(now);

        info!(
            "Batch of {} messages produced in {:.2}s",
            self.config.report_every,
            batch_elapsed.as_secs_f64()
        );
        info!(
            "Total messages: {}, Running time: {:.2}s",
            state.messages_produced(),
            total_elapsed.as_secs_f64()
        );
        info!(
            "Current rate: ~{:.0} logs/sec (delivered: {}, failed: {}, dropped: {})",
            throughput(self.config.report_every, batch_elapsed),
            self.delivery.delivered(),
            self.delivery.failed(),
            state.submissions_dropped()
        );

        if let Err(e) = self.sink.flush(self.config.flush_timeout).await {
            warn!("Periodic flush did not complete: {e}");
        }
        state.start_batch(now);
    }

    async fn enter_limit_reached(&self, state: &mut RunState) {
        info!(
            "Reached TOTAL_LOGS limit of {}. Continuing to run without producing messages...",
            self.config.total_logs
        );
        if let Err(e) = self.sink.flush(self.config.flush_timeout).await {
            warn!("Flush after reaching the limit did not complete: {e}");
        }
        state.reach_limit(Instant::now());
    }
}
