//! Dispatcher - main loop for fan-out to sinks
//!
//! Single consumer of the ingest queue. Each reading is delivered to every
//! registered sink in order; a sink failure is logged and never stops the
//! cycle or the loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn, Level};

use contracts::{DispatchSettings, QueueConfig, Reading, SinkError};
use ingestion::{QueueConsumer, RemoveOutcome, StopSignal};
use observability::{DispatchStats, DispatchSummary, UpdateStatus};

use crate::registry::{ErasedSink, SinkRegistry};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sleep after an empty poll (zero disables)
    pub idle_sleep: Duration,
    /// Bounded wait for each queue remove
    pub remove_wait: Duration,
    /// Overall run time; `None` runs until stopped
    pub time_budget: Option<Duration>,
    /// Log per-sink latency at info and echo each reading as JSON
    pub console_log: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            idle_sleep: Duration::from_secs(1),
            remove_wait: Duration::from_secs(1),
            time_budget: None,
            console_log: true,
        }
    }
}

impl DispatcherConfig {
    pub fn from_settings(queue: &QueueConfig, dispatch: &DispatchSettings) -> Self {
        Self {
            idle_sleep: queue.idle_sleep(),
            remove_wait: queue.remove_wait(),
            time_budget: dispatch.time_budget(),
            console_log: dispatch.console_log,
        }
    }
}

/// Dispatch loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Between cycles
    Idle,
    /// Blocked on the bounded queue remove
    Waiting,
    /// Delivering a reading to the sinks
    Dispatching,
    /// Terminal
    Stopped,
}

/// One sink's part in a cycle
#[derive(Debug, Clone)]
pub struct SinkAttempt {
    pub sink: String,
    pub status: UpdateStatus,
    pub latency: Duration,
    pub error: Option<SinkError>,
}

/// Result of delivering one reading
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// In registration order
    pub attempts: Vec<SinkAttempt>,
}

impl CycleReport {
    pub fn sink_names(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.sink.as_str()).collect()
    }

    pub fn count(&self, status: UpdateStatus) -> usize {
        self.attempts.iter().filter(|a| a.status == status).count()
    }
}

/// The main Dispatcher that fans out readings to sinks
pub struct Dispatcher {
    config: DispatcherConfig,
    registry: SinkRegistry,
    consumer: QueueConsumer,
    state: DispatchState,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Create a dispatcher around an already started registry
    pub fn new(config: DispatcherConfig, registry: SinkRegistry, consumer: QueueConsumer) -> Self {
        Self {
            config,
            registry,
            consumer,
            state: DispatchState::Idle,
            stats: DispatchStats::new(),
        }
    }

    /// Filter and start `sinks`, then build the dispatcher
    #[instrument(name = "dispatcher_start", skip_all)]
    pub async fn start(
        config: DispatcherConfig,
        sinks: Vec<Box<dyn ErasedSink>>,
        consumer: QueueConsumer,
    ) -> Self {
        let registry = SinkRegistry::start(sinks).await;
        Self::new(config, registry, consumer)
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn registry(&self) -> &SinkRegistry {
        &self.registry
    }

    /// Statistics gathered so far
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Deliver one reading to every registered sink
    pub async fn dispatch_reading(&mut self, reading: &Reading) -> CycleReport {
        let mut report = CycleReport::default();

        for sink in self.registry.iter_mut() {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(sink.update(reading)).catch_unwind().await;
            let result = match outcome {
                Ok(result) => result,
                Err(panic) => Err(SinkError::failed(
                    sink.name(),
                    format!("panicked: {}", panic_message(panic.as_ref())),
                )),
            };
            let latency = started.elapsed();
            let latency_ms = latency.as_secs_f64() * 1000.0;
            let color = reading.color();

            let status = match &result {
                Ok(()) => {
                    if latency_log_level(self.config.console_log) == Level::INFO {
                        info!(sink = %sink.name(), %color, latency_ms, "sink updated");
                    } else {
                        debug!(sink = %sink.name(), %color, latency_ms, "sink updated");
                    }
                    UpdateStatus::Success
                }
                Err(SinkError::RateLimited { retry_after, .. }) => {
                    info!(
                        sink = %sink.name(),
                        %color,
                        ?retry_after,
                        "skipped due to rate limiting"
                    );
                    UpdateStatus::RateLimited
                }
                Err(e) => {
                    error!(sink = %sink.name(), error = %e, latency_ms, "sink update failed");
                    UpdateStatus::Failure
                }
            };

            self.stats.record_update(sink.name(), status, latency_ms);
            observability::record_sink_update(sink.name(), status, latency_ms);
            report.attempts.push(SinkAttempt {
                sink: sink.name().to_string(),
                status,
                latency,
                error: result.err(),
            });
        }

        self.stats.record_cycle();
        observability::record_reading_dispatched();

        if self.config.console_log {
            match serde_json::to_string(reading) {
                Ok(json) => info!(reading = %json, "reading dispatched"),
                Err(e) => warn!(error = %e, "failed to serialize reading"),
            }
        }

        report
    }

    /// Run the dispatcher main loop
    ///
    /// Returns when `stop` fires, the time budget elapses, or the queue is
    /// closed and drained. A cycle already in progress finishes first.
    #[instrument(name = "dispatcher_run", skip_all, fields(sinks = self.registry.len()))]
    pub async fn run(&mut self, mut stop: StopSignal) -> DispatchSummary {
        info!(sinks = ?self.registry.names(), "Dispatcher started");
        let deadline = self.config.time_budget.map(|budget| Instant::now() + budget);
        self.state = DispatchState::Idle;

        loop {
            if stop.is_stopped() {
                info!("stop requested");
                break;
            }
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if remaining.is_some_and(|left| left.is_zero()) {
                info!("time budget elapsed");
                break;
            }
            let bounded = |wait: Duration| remaining.map_or(wait, |left| wait.min(left));

            if self.consumer.take_saturation() {
                self.stats.record_saturation();
                warn!(
                    depth = self.consumer.len(),
                    capacity = self.consumer.capacity(),
                    "ingest queue full, readings dropped"
                );
            }
            observability::record_queue_depth(self.consumer.len());

            self.state = DispatchState::Waiting;
            trace!(state = ?self.state, "polling queue");
            let outcome = tokio::select! {
                biased;
                _ = stop.stopped() => {
                    info!("stop requested");
                    break;
                }
                outcome = self.consumer.remove(bounded(self.config.remove_wait)) => outcome,
            };

            match outcome {
                RemoveOutcome::Reading(reading) => {
                    self.state = DispatchState::Dispatching;
                    debug!(state = ?self.state, color = %reading.color(), "reading removed");
                    self.dispatch_reading(&reading).await;
                    self.state = DispatchState::Idle;
                }
                RemoveOutcome::Empty => {
                    self.state = DispatchState::Idle;
                    self.stats.record_empty_poll();
                    let idle = bounded(self.config.idle_sleep);
                    if !idle.is_zero() {
                        tokio::select! {
                            biased;
                            _ = stop.stopped() => {
                                info!("stop requested");
                                break;
                            }
                            _ = tokio::time::sleep(idle) => {}
                        }
                    }
                }
                RemoveOutcome::Closed => {
                    info!("ingest queue closed and drained");
                    break;
                }
            }
        }

        self.state = DispatchState::Stopped;
        let summary = self.stats.summary();
        info!(
            readings = summary.readings_dispatched,
            saturation_warnings = summary.saturation_warnings,
            "Dispatcher stopped"
        );
        summary
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(mut self, stop: StopSignal) -> JoinHandle<DispatchSummary> {
        tokio::spawn(async move { self.run(stop).await })
    }
}

/// Level of the per-sink latency log
fn latency_log_level(console_log: bool) -> Level {
    if console_log {
        Level::INFO
    } else {
        Level::DEBUG
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::boxed;
    use contracts::{ReadingSink, TiltColor, ValidityConfig};
    use ingestion::{ingest_queue, stop_channel};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Fail,
        RateLimit,
        Panic,
    }

    type CallLog = Arc<Mutex<Vec<(String, f64)>>>;

    struct RecordingSink {
        name: String,
        behavior: Behavior,
        calls: CallLog,
    }

    impl ReadingSink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }

        fn enabled(&self) -> bool {
            true
        }

        async fn start(&mut self) -> Result<Option<String>, SinkError> {
            Ok(None)
        }

        async fn update(&mut self, reading: &Reading) -> Result<(), SinkError> {
            self.calls
                .lock()
                .unwrap()
                .push((self.name.clone(), reading.temp_fahrenheit()));
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(SinkError::failed(&self.name, "boom")),
                Behavior::RateLimit => Err(SinkError::rate_limited(&self.name, None)),
                Behavior::Panic => panic!("sink {} exploded", self.name),
            }
        }
    }

    fn sink(name: &str, behavior: Behavior, calls: &CallLog) -> Box<dyn ErasedSink> {
        boxed(RecordingSink {
            name: name.to_string(),
            behavior,
            calls: Arc::clone(calls),
        })
    }

    fn reading(major: u16) -> Reading {
        Reading::from_beacon_fields(
            TiltColor::Green,
            "green",
            major,
            1000,
            None,
            &ValidityConfig::default(),
        )
    }

    fn fast_config() -> DispatcherConfig {
        DispatcherConfig {
            idle_sleep: Duration::from_millis(5),
            remove_wait: Duration::from_millis(10),
            time_budget: None,
            console_log: false,
        }
    }

    #[tokio::test]
    async fn test_every_sink_attempted_in_order() {
        let calls = CallLog::default();
        let (_producer, consumer) = ingest_queue(3);
        let mut dispatcher = Dispatcher::start(
            fast_config(),
            vec![
                sink("broken", Behavior::Fail, &calls),
                sink("limited", Behavior::RateLimit, &calls),
                sink("healthy", Behavior::Succeed, &calls),
            ],
            consumer,
        )
        .await;
        assert_eq!(dispatcher.state(), DispatchState::Idle);

        let report = dispatcher.dispatch_reading(&reading(70)).await;
        assert_eq!(report.sink_names(), vec!["broken", "limited", "healthy"]);
        assert_eq!(report.count(UpdateStatus::Failure), 1);
        assert_eq!(report.count(UpdateStatus::RateLimited), 1);
        assert_eq!(report.count(UpdateStatus::Success), 1);
        assert!(report.attempts[0].error.is_some());
        assert!(report.attempts[2].error.is_none());

        let calls = calls.lock().unwrap();
        let order: Vec<_> = calls.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(order, vec!["broken", "limited", "healthy"]);
    }

    #[tokio::test]
    async fn test_rate_limited_sink_tried_again_next_cycle() {
        let calls = CallLog::default();
        let (_producer, consumer) = ingest_queue(3);
        let mut dispatcher = Dispatcher::start(
            fast_config(),
            vec![
                sink("limited", Behavior::RateLimit, &calls),
                sink("after", Behavior::Succeed, &calls),
            ],
            consumer,
        )
        .await;

        dispatcher.dispatch_reading(&reading(70)).await;
        dispatcher.dispatch_reading(&reading(71)).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|(n, _)| n == "limited").count(), 2);
        assert_eq!(calls.iter().filter(|(n, _)| n == "after").count(), 2);

        let stats = &dispatcher.stats().sinks;
        assert_eq!(stats["limited"].rate_limited, 2);
        assert_eq!(stats["limited"].failures, 0);
    }

    #[tokio::test]
    async fn test_run_drains_in_fifo_order_until_stopped() {
        let calls = CallLog::default();
        let (producer, consumer) = ingest_queue(5);
        let dispatcher = Dispatcher::start(
            fast_config(),
            vec![sink("only", Behavior::Succeed, &calls)],
            consumer,
        )
        .await;

        for temp in [60, 61, 62] {
            producer.try_insert(reading(temp));
        }

        let (stop, signal) = stop_channel();
        let task = dispatcher.spawn(signal);
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.stop();

        let summary = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("dispatcher did not stop")
            .unwrap();
        assert_eq!(summary.readings_dispatched, 3);

        let temps: Vec<_> = calls.lock().unwrap().iter().map(|(_, t)| *t).collect();
        assert_eq!(temps, vec![60.0, 61.0, 62.0]);
        drop(producer);
    }

    #[tokio::test]
    async fn test_time_budget_reaches_stopped() {
        let (_producer, consumer) = ingest_queue(1);
        let mut config = fast_config();
        config.time_budget = Some(Duration::from_millis(50));
        let mut dispatcher = Dispatcher::start(config, Vec::new(), consumer).await;

        let (_stop, signal) = stop_channel();
        tokio::time::timeout(Duration::from_secs(2), dispatcher.run(signal))
            .await
            .expect("time budget ignored");
        assert_eq!(dispatcher.state(), DispatchState::Stopped);
    }

    #[tokio::test]
    async fn test_closed_queue_stops_after_drain() {
        let calls = CallLog::default();
        let (producer, consumer) = ingest_queue(2);
        producer.try_insert(reading(70));
        drop(producer);

        let mut dispatcher = Dispatcher::start(
            fast_config(),
            vec![sink("only", Behavior::Succeed, &calls)],
            consumer,
        )
        .await;
        let (_stop, signal) = stop_channel();
        let summary = tokio::time::timeout(Duration::from_secs(2), dispatcher.run(signal))
            .await
            .expect("closed queue should end the loop");

        assert_eq!(summary.readings_dispatched, 1);
        assert_eq!(dispatcher.state(), DispatchState::Stopped);
    }

    #[tokio::test]
    async fn test_saturation_reported_once() {
        let (producer, consumer) = ingest_queue(1);
        producer.try_insert(reading(70));
        producer.try_insert(reading(71));
        drop(producer);

        let mut dispatcher = Dispatcher::start(fast_config(), Vec::new(), consumer).await;
        let (_stop, signal) = stop_channel();
        let summary = dispatcher.run(signal).await;
        assert_eq!(summary.saturation_warnings, 1);
        assert_eq!(summary.readings_dispatched, 1);
    }

    #[test]
    fn test_config_from_settings() {
        let queue = QueueConfig::default();
        let dispatch = DispatchSettings {
            console_log: false,
            timeout_seconds: 30,
        };
        let config = DispatcherConfig::from_settings(&queue, &dispatch);
        assert_eq!(config.time_budget, Some(Duration::from_secs(30)));
        assert_eq!(config.remove_wait, Duration::from_secs(1));
        assert!(!config.console_log);
    }

    #[tokio::test]
    async fn test_panicking_sink_isolated() {
        let calls = CallLog::default();
        let (producer, consumer) = ingest_queue(3);
        let dispatcher = Dispatcher::start(
            fast_config(),
            vec![
                sink("exploding", Behavior::Panic, &calls),
                sink("steady", Behavior::Succeed, &calls),
            ],
            consumer,
        )
        .await;

        producer.try_insert(reading(60));
        producer.try_insert(reading(61));

        let (stop, signal) = stop_channel();
        let handle = dispatcher.spawn(signal);
        for _ in 0..200 {
            if calls.lock().unwrap().len() >= 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        stop.stop();
        let summary = handle.await.expect("dispatch loop survives a panicking sink");

        assert_eq!(summary.readings_dispatched, 2);
        assert_eq!(summary.sinks["exploding"].failures, 2);
        assert_eq!(summary.sinks["steady"].successes, 2);

        let calls = calls.lock().unwrap();
        let steady: Vec<_> = calls
            .iter()
            .filter(|(name, _)| name == "steady")
            .map(|(_, temp)| *temp)
            .collect();
        assert_eq!(steady, vec![60.0, 61.0]);
    }

    #[tokio::test]
    async fn test_panic_reported_as_failure() {
        let calls = CallLog::default();
        let (_producer, consumer) = ingest_queue(1);
        let mut dispatcher = Dispatcher::start(
            fast_config(),
            vec![
                sink("exploding", Behavior::Panic, &calls),
                sink("steady", Behavior::Succeed, &calls),
            ],
            consumer,
        )
        .await;

        let report = dispatcher.dispatch_reading(&reading(70)).await;
        assert_eq!(report.sink_names(), vec!["exploding", "steady"]);
        assert_eq!(report.attempts[0].status, UpdateStatus::Failure);
        let Some(SinkError::Failed { message, .. }) = &report.attempts[0].error else {
            panic!("expected a failure, got {:?}", report.attempts[0].error);
        };
        assert!(message.contains("sink exploding exploded"), "{message}");
        assert_eq!(report.attempts[1].status, UpdateStatus::Success);
    }

    #[test]
    fn test_latency_log_level_follows_console_log() {
        assert_eq!(latency_log_level(true), Level::INFO);
        assert_eq!(latency_log_level(false), Level::DEBUG);
    }
}
