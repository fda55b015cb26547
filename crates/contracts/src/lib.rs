//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Flow
//! - `ScanEvent` -> `DecodedBeacon` -> `Reading` -> `ReadingSink::update`
//! - A `Reading` is never mutated after construction

mod beacon;
mod color;
mod config;
mod error;
mod reading;
mod sink;

pub use beacon::*;
pub use color::TiltColor;
pub use config::*;
pub use error::*;
pub use reading::{decimal_gravity, Reading};
pub use sink::*;
