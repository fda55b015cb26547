//! Ingestion metrics
//!
//! Atomics for the run summary; each record also feeds the `metrics`
//! facade so an installed exporter sees the same counts.

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion counters
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Advertisements delivered by the scan source
    pub advertisements_seen: AtomicU64,

    /// Advertisements that decoded as iBeacon frames
    pub beacons_decoded: AtomicU64,

    /// Beacons with an identifier outside the identity table
    pub unknown_devices: AtomicU64,

    /// Readings failing a validity check
    pub readings_invalid: AtomicU64,

    /// Readings accepted by the queue
    pub readings_queued: AtomicU64,

    /// Readings rejected by a full queue
    pub readings_dropped: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_advertisement(&self) {
        self.advertisements_seen.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tilt_relay_advertisements_total").increment(1);
    }

    pub fn record_decoded(&self) {
        self.beacons_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown(&self) {
        self.unknown_devices.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tilt_relay_readings_total", "status" => "unknown").increment(1);
    }

    pub fn record_invalid(&self) {
        self.readings_invalid.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tilt_relay_readings_total", "status" => "invalid").increment(1);
    }

    pub fn record_queued(&self, depth: usize) {
        self.readings_queued.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tilt_relay_readings_total", "status" => "queued").increment(1);
        metrics::gauge!("tilt_relay_queue_depth").set(depth as f64);
    }

    pub fn record_dropped(&self) {
        self.readings_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tilt_relay_readings_total", "status" => "dropped").increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> IngestionSnapshot {
        IngestionSnapshot {
            advertisements_seen: self.advertisements_seen.load(Ordering::Relaxed),
            beacons_decoded: self.beacons_decoded.load(Ordering::Relaxed),
            unknown_devices: self.unknown_devices.load(Ordering::Relaxed),
            readings_invalid: self.readings_invalid.load(Ordering::Relaxed),
            readings_queued: self.readings_queued.load(Ordering::Relaxed),
            readings_dropped: self.readings_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`IngestionMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionSnapshot {
    pub advertisements_seen: u64,
    pub beacons_decoded: u64,
    pub unknown_devices: u64,
    pub readings_invalid: u64,
    pub readings_queued: u64,
    pub readings_dropped: u64,
}
