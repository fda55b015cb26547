//! ReadingSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for downstream sinks.

use std::time::Duration;

use thiserror::Error;

use crate::Reading;

/// Outcome of a failed sink update
///
/// The dispatcher only distinguishes rate limiting from everything else.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SinkError {
    /// Update rejected because the sink is throttled; not a failure
    #[error("sink '{sink}' rate limited")]
    RateLimited {
        sink: String,
        /// Time until the sink accepts the next update, if known
        retry_after: Option<Duration>,
    },

    /// Any other failure
    #[error("sink '{sink}' failed: {message}")]
    Failed { sink: String, message: String },
}

impl SinkError {
    /// Create a rate-limited outcome
    pub fn rate_limited(sink: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            sink: sink.into(),
            retry_after,
        }
    }

    /// Create a generic failure
    pub fn failed(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Downstream consumer of readings
///
/// All sink implementations must implement this trait.
#[trait_variant::make(ReadingSink: Send)]
pub trait LocalReadingSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Whether this sink takes part in dispatch
    ///
    /// Evaluated once before the dispatch loop starts.
    fn enabled(&self) -> bool;

    /// Prepare the sink; the returned text is surfaced in the startup log
    ///
    /// # Errors
    /// Returns a failure if the sink cannot be prepared
    async fn start(&mut self) -> Result<Option<String>, SinkError>;

    /// Deliver one reading
    ///
    /// # Errors
    /// `SinkError::RateLimited` when throttled, `SinkError::Failed` otherwise
    async fn update(&mut self, reading: &Reading) -> Result<(), SinkError>;
}
