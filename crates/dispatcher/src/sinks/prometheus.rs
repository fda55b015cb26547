//! PrometheusSink - publishes the latest reading per colour as gauges
//!
//! Gauges go to whichever `metrics` recorder is installed; the HTTP
//! exporter itself is set up by `observability`.

use contracts::{Reading, ReadingSink, SinkError};
use tracing::instrument;

pub struct PrometheusSink {
    name: String,
    enabled: bool,
}

impl PrometheusSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl ReadingSink for PrometheusSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn start(&mut self) -> Result<Option<String>, SinkError> {
        Ok(Some("publishing per-colour gauges".to_string()))
    }

    #[instrument(
        name = "prometheus_sink_update",
        skip(self, reading),
        fields(sink = %self.name, color = %reading.color())
    )]
    async fn update(&mut self, reading: &Reading) -> Result<(), SinkError> {
        observability::record_reading(reading);
        Ok(())
    }
}
