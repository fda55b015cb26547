//! Relay run statistics.

use std::time::Duration;

use ingestion::IngestionSnapshot;
use observability::DispatchSummary;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Ingestion counters at shutdown
    pub ingestion: IngestionSnapshot,

    /// Dispatcher summary
    pub dispatch: DispatchSummary,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of sinks that took part in dispatch
    pub active_sinks: usize,
}

impl PipelineStats {
    /// Dispatched readings per minute
    pub fn readings_per_minute(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.dispatch.readings_dispatched as f64 * 60.0 / secs
        } else {
            0.0
        }
    }

    /// Share of built readings lost to a full queue, as percentage
    pub fn drop_rate(&self) -> f64 {
        let total = self.ingestion.readings_queued + self.ingestion.readings_dropped;
        if total > 0 {
            (self.ingestion.readings_dropped as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Relay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Readings dispatched: {}", self.dispatch.readings_dispatched);
        println!("   ├─ Readings/min: {:.2}", self.readings_per_minute());
        println!("   └─ Active sinks: {}", self.active_sinks);

        let ingestion = &self.ingestion;
        println!("\n📡 Ingestion");
        println!("   ├─ Advertisements seen: {}", ingestion.advertisements_seen);
        println!("   ├─ Beacons decoded: {}", ingestion.beacons_decoded);
        println!("   ├─ Unknown devices: {}", ingestion.unknown_devices);
        println!("   ├─ Invalid readings: {}", ingestion.readings_invalid);
        println!("   ├─ Queued: {}", ingestion.readings_queued);
        println!(
            "   └─ Dropped (queue full): {} ({:.2}%)",
            ingestion.readings_dropped,
            self.drop_rate()
        );

        if !self.dispatch.sinks.is_empty() {
            println!("\n📤 Sinks");
            let last = self.dispatch.sinks.len() - 1;
            for (i, (name, sink)) in self.dispatch.sinks.iter().enumerate() {
                let prefix = if i == last { "└─" } else { "├─" };
                println!(
                    "   {} {}: ok={} rate_limited={} failed={}",
                    prefix, name, sink.successes, sink.rate_limited, sink.failures
                );
                let child = if i == last { "   " } else { "│  " };
                println!("   {}  latency_ms: {}", child, sink.latency_ms);
            }
        }

        if self.dispatch.saturation_warnings > 0 {
            println!(
                "\n⚠️  Queue saturated {} time(s)",
                self.dispatch.saturation_warnings
            );
        }

        println!();
    }
}
