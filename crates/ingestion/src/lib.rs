//! # Ingestion Pipeline
//!
//! Beacon ingestion module.
//!
//! Responsibilities:
//! - Drive a scan source (live bluetooth or synthetic)
//! - Decode iBeacon payloads into `DecodedBeacon`
//! - Resolve identity and validate into `Reading`
//! - Hand readings to the dispatcher through a bounded, drop-if-full queue
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{ingest_queue, stop_channel, IdentityTable, IngestionPipeline,
//!                 ReadingBuilder, SyntheticSource};
//!
//! let (producer, consumer) = ingest_queue(3);
//! let builder = ReadingBuilder::new(Arc::new(IdentityTable::standard()), validity);
//! let pipeline = IngestionPipeline::new(builder, producer);
//!
//! let (stop, signal) = stop_channel();
//! let mut source = SyntheticSource::default();
//! pipeline.run(&mut source, signal).await?;
//! ```

mod builder;
mod decoder;
mod error;
mod identity;
mod metrics;
mod pipeline;
mod queue;
mod shutdown;
mod source;
mod sources;

// Re-exports
pub use builder::{BuildOutcome, ReadingBuilder, Rejection};
pub use decoder::{decode_advertisement, decode_ibeacon};
pub use error::{IngestionError, Result};
pub use identity::{IdentityTable, KNOWN_DEVICES, SIMULATED_ID};
pub use metrics::{IngestionMetrics, IngestionSnapshot};
pub use pipeline::{EventOutcome, IngestionPipeline};
pub use queue::{ingest_queue, InsertOutcome, QueueConsumer, QueueProducer, RemoveOutcome};
pub use shutdown::{stop_channel, StopHandle, StopSignal};
pub use source::{LocalScanSource, ScanEventCallback, ScanSource};
#[cfg(feature = "ble")]
pub use sources::BleScanSource;
pub use sources::{SyntheticSource, DEFAULT_SYNTHETIC_INTERVAL};
