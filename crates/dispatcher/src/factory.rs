//! Sink factory - `SinkConfig` -> boxed sink

use std::time::Duration;

use contracts::{ReadingSink, SinkConfig, SinkType};
use tracing::instrument;

use crate::error::DispatcherError;
use crate::rate_limit::RateLimitedSink;
use crate::registry::{boxed, ErasedSink};
use crate::sinks::{FileSink, LogSink, NetworkSink, PrometheusSink};

/// Create all configured sinks, preserving configuration order
pub fn create_sinks(configs: &[SinkConfig]) -> Result<Vec<Box<dyn ErasedSink>>, DispatcherError> {
    configs.iter().map(create_sink).collect()
}

/// Create one sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn ErasedSink>, DispatcherError> {
    let rate_limit = config
        .rate_limit_seconds
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
    match config.sink_type {
        SinkType::Log => Ok(wrap(
            LogSink::new(&config.name).with_enabled(config.enabled),
            rate_limit,
        )),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e))?;
            Ok(wrap(sink.with_enabled(config.enabled), rate_limit))
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e))?;
            Ok(wrap(sink.with_enabled(config.enabled), rate_limit))
        }
        SinkType::Prometheus => Ok(wrap(
            PrometheusSink::new(&config.name).with_enabled(config.enabled),
            rate_limit,
        )),
    }
}

fn wrap<S: ReadingSink + Send + 'static>(
    sink: S,
    rate_limit: Option<Duration>,
) -> Box<dyn ErasedSink> {
    match rate_limit {
        Some(interval) if !interval.is_zero() => boxed(RateLimitedSink::new(sink, interval)),
        _ => boxed(sink),
    }
}
