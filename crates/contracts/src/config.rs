//! RelayConfig - Config Loader output
//!
//! Top-level configuration shared by every crate. Every section has
//! defaults, so an empty file is a valid (log-only) configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::TiltColor;

/// Complete relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Ingest queue sizing and timing
    #[serde(default)]
    pub queue: QueueConfig,

    /// Acceptable reading ranges
    #[serde(default)]
    pub validity: ValidityConfig,

    /// Scan source selection
    #[serde(default)]
    pub scan: ScanConfig,

    /// Dispatch loop behaviour
    #[serde(default)]
    pub dispatch: DispatchSettings,

    /// Per-colour device profiles
    #[serde(default)]
    pub devices: BTreeMap<TiltColor, DeviceProfile>,

    /// Sinks, in dispatch order
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Ingest queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Fixed capacity of the hand-off queue
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Bounded wait for one remove attempt (milliseconds)
    #[serde(default = "default_remove_wait_ms")]
    pub remove_wait_ms: u64,

    /// Sleep when the queue is found empty (milliseconds, 0 = none)
    #[serde(default = "default_idle_sleep_ms")]
    pub idle_sleep_ms: u64,
}

fn default_queue_capacity() -> usize {
    3
}

fn default_remove_wait_ms() -> u64 {
    1000
}

fn default_idle_sleep_ms() -> u64 {
    1000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            remove_wait_ms: default_remove_wait_ms(),
            idle_sleep_ms: default_idle_sleep_ms(),
        }
    }
}

impl QueueConfig {
    pub fn remove_wait(&self) -> Duration {
        Duration::from_millis(self.remove_wait_ms)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }
}

/// Acceptable ranges for temperature (°F) and specific gravity
///
/// Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidityConfig {
    #[serde(default = "default_temp_min_f")]
    pub temp_min_f: f64,
    #[serde(default = "default_temp_max_f")]
    pub temp_max_f: f64,
    #[serde(default = "default_gravity_min")]
    pub gravity_min: f64,
    #[serde(default = "default_gravity_max")]
    pub gravity_max: f64,
}

fn default_temp_min_f() -> f64 {
    32.0
}

fn default_temp_max_f() -> f64 {
    212.0
}

fn default_gravity_min() -> f64 {
    0.7
}

fn default_gravity_max() -> f64 {
    1.4
}

impl Default for ValidityConfig {
    fn default() -> Self {
        Self {
            temp_min_f: default_temp_min_f(),
            temp_max_f: default_temp_max_f(),
            gravity_min: default_gravity_min(),
            gravity_max: default_gravity_max(),
        }
    }
}

impl ValidityConfig {
    pub fn temp_in_range(&self, temp_f: f64) -> bool {
        (self.temp_min_f..=self.temp_max_f).contains(&temp_f)
    }

    pub fn gravity_in_range(&self, gravity: f64) -> bool {
        (self.gravity_min..=self.gravity_max).contains(&gravity)
    }
}

/// Scan source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Use the synthetic source instead of the radio
    #[serde(default)]
    pub simulate: bool,

    /// Synthetic emission interval (milliseconds)
    #[serde(default = "default_synthetic_interval_ms")]
    pub synthetic_interval_ms: u64,

    /// Index of the Bluetooth adapter to scan with
    #[serde(default)]
    pub adapter_index: usize,
}

fn default_synthetic_interval_ms() -> u64 {
    250
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            simulate: false,
            synthetic_interval_ms: default_synthetic_interval_ms(),
            adapter_index: 0,
        }
    }
}

impl ScanConfig {
    pub fn synthetic_interval(&self) -> Duration {
        Duration::from_millis(self.synthetic_interval_ms)
    }
}

/// Dispatch loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Log per-sink latency and echo each reading
    #[serde(default = "default_true")]
    pub console_log: bool,

    /// Overall run budget in seconds (0 = unlimited)
    #[serde(default)]
    pub timeout_seconds: u64,
}

fn default_true() -> bool {
    true
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            console_log: true,
            timeout_seconds: 0,
        }
    }
}

impl DispatchSettings {
    pub fn time_budget(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

/// Per-colour device profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Display name (e.g. the beer in the fermenter)
    #[serde(default)]
    pub name: Option<String>,

    /// Original gravity, enables ABV and attenuation figures
    #[serde(default)]
    pub original_gravity: Option<f64>,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Whether the sink takes part in dispatch
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum spacing between updates per colour (seconds)
    #[serde(default)]
    pub rate_limit_seconds: Option<f64>,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Structured log output
    Log,
    /// JSON lines file
    File,
    /// UDP datagrams
    Network,
    /// Prometheus gauges
    Prometheus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.queue.capacity, 3);
        assert_eq!(config.queue.remove_wait(), Duration::from_secs(1));
        assert_eq!(config.scan.synthetic_interval(), Duration::from_millis(250));
        assert!(config.dispatch.console_log);
        assert_eq!(config.dispatch.time_budget(), None);
        assert!(config.sinks.is_empty());
    }

    #[test]
    fn test_validity_bounds_inclusive() {
        let validity = ValidityConfig::default();
        assert!(validity.temp_in_range(32.0));
        assert!(validity.temp_in_range(212.0));
        assert!(!validity.temp_in_range(212.5));
        assert!(validity.gravity_in_range(0.7));
        assert!(!validity.gravity_in_range(1.401));
    }

    #[test]
    fn test_sink_config_from_json() {
        let json = r#"{ "name": "console", "sink_type": "log" }"#;
        let sink: SinkConfig = serde_json::from_str(json).unwrap();
        assert!(sink.enabled);
        assert_eq!(sink.sink_type, SinkType::Log);
        assert!(sink.rate_limit_seconds.is_none());
    }
}
