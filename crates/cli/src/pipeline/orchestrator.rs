//! Relay orchestrator - wires source, queue, dispatcher and sinks.
//!
//! Ingestion runs in the calling task; the dispatcher runs in its own
//! spawned task. Both observe the same stop signal.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::RelayConfig;
use dispatcher::{create_sinks, Dispatcher, DispatcherConfig};
use ingestion::{
    ingest_queue, stop_channel, IdentityTable, IngestionPipeline, ReadingBuilder, StopSignal,
    SyntheticSource,
};
use tracing::{info, warn};

use super::PipelineStats;

/// Relay configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated relay configuration (CLI overrides applied)
    pub relay: RelayConfig,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main relay orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new relay with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves, the time budget elapses or the source fails
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let relay = &self.config.relay;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup ingestion
        let (producer, consumer) = ingest_queue(relay.queue.capacity);
        let builder = ReadingBuilder::new(Arc::new(IdentityTable::standard()), relay.validity)
            .with_profiles(relay.devices.clone());
        let ingestion = IngestionPipeline::new(builder, producer);
        info!(
            capacity = relay.queue.capacity,
            profiles = relay.devices.len(),
            "Ingestion configured"
        );

        // Setup dispatcher
        let sinks = create_sinks(&relay.sinks).context("Failed to create sinks")?;
        let (stop, signal) = stop_channel();
        let dispatcher = Dispatcher::start(
            DispatcherConfig::from_settings(&relay.queue, &relay.dispatch),
            sinks,
            consumer,
        )
        .await;
        let active_sinks = dispatcher.registry().len();
        if active_sinks == 0 {
            warn!("No enabled sinks, readings will be discarded");
        }
        let dispatch_task = dispatcher.spawn(signal.clone());

        // Scan until stopped
        let scan_result = {
            let scan = self.scan(&ingestion, signal);
            tokio::pin!(scan);
            let finished_early = tokio::select! {
                result = &mut scan => Some(result),
                _ = wait_for_stop(shutdown, relay.dispatch.time_budget()) => None,
            };
            stop.stop();
            match finished_early {
                Some(result) => result,
                None => scan.await,
            }
        };

        let dispatch = dispatch_task
            .await
            .context("Dispatcher task terminated abnormally")?;
        let ingestion_snapshot = ingestion.metrics().snapshot();
        drop(ingestion);

        scan_result.context("Scan source failed")?;

        Ok(PipelineStats {
            ingestion: ingestion_snapshot,
            dispatch,
            duration: start_time.elapsed(),
            active_sinks,
        })
    }

    async fn scan(&self, ingestion: &IngestionPipeline, signal: StopSignal) -> ingestion::Result<()> {
        let scan = &self.config.relay.scan;
        if scan.simulate {
            info!(interval_ms = scan.synthetic_interval_ms, "Running with the synthetic source");
            let mut source = SyntheticSource::new(scan.synthetic_interval());
            return ingestion.run(&mut source, signal).await;
        }

        #[cfg(feature = "ble")]
        let result = {
            info!(adapter = scan.adapter_index, "Scanning with bluetooth adapter");
            let mut source = ingestion::BleScanSource::new(scan.adapter_index);
            ingestion.run(&mut source, signal).await
        };

        #[cfg(not(feature = "ble"))]
        let result = {
            warn!("Built without bluetooth support, falling back to the synthetic source");
            let mut source = SyntheticSource::new(scan.synthetic_interval());
            ingestion.run(&mut source, signal).await
        };

        result
    }
}

/// Resolve on external shutdown or when the time budget runs out
async fn wait_for_stop<F>(shutdown: F, budget: Option<Duration>)
where
    F: Future<Output = ()>,
{
    let budget_elapsed = async {
        match budget {
            Some(budget) => tokio::time::sleep(budget).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown => {}
        _ = budget_elapsed => info!("Run timeout reached"),
    }
}
