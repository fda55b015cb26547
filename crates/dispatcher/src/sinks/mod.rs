//! Sink implementations
//!
//! Contains LogSink, FileSink, NetworkSink, and PrometheusSink.

mod file;
mod log;
mod network;
mod prometheus;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::network::{line_protocol, NetworkFormat, NetworkSink, NetworkSinkConfig};
pub use self::prometheus::PrometheusSink;
