//! LogSink - logs reading summary via tracing

use contracts::{Reading, ReadingSink, SinkError};
use tracing::{info, instrument};

/// Sink that logs readings for debugging
pub struct LogSink {
    name: String,
    enabled: bool,
}

impl LogSink {
    /// Create a new LogSink with the given name
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

    fn log_reading_summary(&self, reading: &Reading) {
        info!(
            sink = %self.name,
            color = %reading.color(),
            name = reading.name(),
            temp_f = reading.temp_fahrenheit(),
            gravity = reading.gravity(),
            abv = ?reading.alcohol_by_volume(),
            "Reading received"
        );
    }
}

impl ReadingSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn start(&mut self) -> Result<Option<String>, SinkError> {
        Ok(Some("logging readings".to_string()))
    }

    #[instrument(
        name = "log_sink_update",
        skip(self, reading),
        fields(sink = %self.name, color = %reading.color())
    )]
    async fn update(&mut self, reading: &Reading) -> Result<(), SinkError> {
        self.log_reading_summary(reading);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{TiltColor, ValidityConfig};

    #[tokio::test]
    async fn test_log_sink_update() {
        let mut sink = LogSink::new("test_log");
        let reading = Reading::from_beacon_fields(
            TiltColor::Yellow,
            "yellow",
            64,
            1048,
            None,
            &ValidityConfig::default(),
        );

        assert!(sink.update(&reading).await.is_ok());
    }

    #[test]
    fn test_log_sink_enabled_flag() {
        let sink = LogSink::new("my_logger").with_enabled(false);
        assert_eq!(sink.name(), "my_logger");
        assert!(!sink.enabled());
    }
}
