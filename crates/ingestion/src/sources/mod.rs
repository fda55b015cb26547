//! Scan source implementations

#[cfg(feature = "ble")]
mod ble;
mod synthetic;

#[cfg(feature = "ble")]
pub use ble::BleScanSource;
pub use synthetic::{SyntheticSource, DEFAULT_SYNTHETIC_INTERVAL};
