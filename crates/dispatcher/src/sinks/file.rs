//! FileSink - appends readings to a JSON-lines file

use contracts::{Reading, ReadingSink, SinkError};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file (created if missing, appended otherwise)
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;

        Ok(Self { path })
    }
}

/// Sink that writes one JSON object per line
pub struct FileSink {
    name: String,
    enabled: bool,
    config: FileSinkConfig,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink; the file is opened by `start`
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            config,
            writer: None,
        }
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, String> {
        let config = FileSinkConfig::from_params(params)?;
        Ok(Self::new(name, config))
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn open(&self) -> std::io::Result<BufWriter<File>> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.path)?;
        Ok(BufWriter::new(file))
    }

    fn append_line(&mut self, reading: &Reading) -> std::io::Result<()> {
        if self.writer.is_none() {
            self.writer = Some(self.open()?);
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        serde_json::to_writer(&mut *writer, reading)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl ReadingSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    #[instrument(name = "file_sink_start", skip(self), fields(sink = %self.name))]
    async fn start(&mut self) -> Result<Option<String>, SinkError> {
        let writer = self
            .open()
            .map_err(|e| SinkError::failed(&self.name, e.to_string()))?;
        self.writer = Some(writer);
        debug!(sink = %self.name, path = %self.config.path.display(), "FileSink opened");
        Ok(Some(format!("appending to {}", self.config.path.display())))
    }

    #[instrument(
        name = "file_sink_update",
        skip(self, reading),
        fields(sink = %self.name, color = %reading.color())
    )]
    async fn update(&mut self, reading: &Reading) -> Result<(), SinkError> {
        self.append_line(reading).map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            SinkError::failed(&self.name, e.to_string())
        })
    }
}
