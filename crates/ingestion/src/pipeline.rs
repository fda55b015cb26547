//! Ingestion pipeline main entry
//!
//! Scan event -> decoder -> reading builder -> ingest queue.

use std::sync::Arc;

use contracts::ScanEvent;
use tracing::{debug, info, instrument};

use crate::builder::{BuildOutcome, ReadingBuilder, Rejection};
use crate::decoder::decode_advertisement;
use crate::error::Result;
use crate::metrics::IngestionMetrics;
use crate::queue::{InsertOutcome, QueueProducer};
use crate::shutdown::StopSignal;
use crate::source::{ScanEventCallback, ScanSource};

/// What happened to one scan event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    /// Not an iBeacon frame under the Apple identifier
    NotRecognized,
    /// Identifier not in the identity table
    UnknownDevice,
    /// Failed a validity check
    Invalid(Rejection),
    /// Inserted into the ingest queue
    Queued,
    /// Queue full (or consumer gone)
    Dropped,
}

struct PipelineInner {
    builder: ReadingBuilder,
    producer: QueueProducer,
    metrics: Arc<IngestionMetrics>,
}

/// Ingestion pipeline
///
/// Cheap to clone; every clone feeds the same queue.
#[derive(Clone)]
pub struct IngestionPipeline {
    inner: Arc<PipelineInner>,
}

impl IngestionPipeline {
    pub fn new(builder: ReadingBuilder, producer: QueueProducer) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                builder,
                producer,
                metrics: Arc::new(IngestionMetrics::new()),
            }),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    /// Process one scan event
    ///
    /// Never fails: every outcome other than `Queued` is a discard.
    pub fn handle_event(&self, event: &ScanEvent) -> EventOutcome {
        let inner = &self.inner;
        inner.metrics.record_advertisement();

        let Some(beacon) = decode_advertisement(&event.advertisement) else {
            return EventOutcome::NotRecognized;
        };
        inner.metrics.record_decoded();

        match inner.builder.build(&beacon) {
            BuildOutcome::UnknownDevice(_) => {
                inner.metrics.record_unknown();
                EventOutcome::UnknownDevice
            }
            BuildOutcome::Rejected(rejection) => {
                inner.metrics.record_invalid();
                match rejection {
                    Rejection::Temperature { color, temp_f } => {
                        info!(%color, temp_f, "Ignoring broadcast due to invalid temperature");
                    }
                    Rejection::Gravity { color, gravity } => {
                        info!(%color, gravity, "Ignoring broadcast due to invalid gravity");
                    }
                }
                EventOutcome::Invalid(rejection)
            }
            BuildOutcome::Accepted(reading) => match inner.producer.try_insert(reading) {
                InsertOutcome::Queued => {
                    inner.metrics.record_queued(inner.producer.len());
                    EventOutcome::Queued
                }
                InsertOutcome::Dropped | InsertOutcome::Closed => {
                    inner.metrics.record_dropped();
                    EventOutcome::Dropped
                }
            },
        }
    }

    /// Callback handed to a scan source
    pub fn callback(&self) -> ScanEventCallback {
        let pipeline = self.clone();
        Arc::new(move |event: ScanEvent| {
            pipeline.handle_event(&event);
        })
    }

    /// Drive a scan source until `stop` fires
    #[instrument(name = "ingestion_run", skip_all, fields(source = %source.name()))]
    pub async fn run<S: ScanSource>(&self, source: &mut S, stop: StopSignal) -> Result<()> {
        debug!("ingestion started");
        let result = source.scan(self.callback(), stop).await;
        let snapshot = self.inner.metrics.snapshot();
        info!(
            advertisements = snapshot.advertisements_seen,
            queued = snapshot.readings_queued,
            dropped = snapshot.readings_dropped,
            invalid = snapshot.readings_invalid,
            unknown = snapshot.unknown_devices,
            "ingestion stopped"
        );
        result
    }
}
