//! NetworkSink - UDP fire-and-forget streaming

use contracts::{Reading, ReadingSink, SinkError};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, instrument};

/// Serialization format for network transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkFormat {
    /// One JSON object per datagram
    #[default]
    Json,
    /// InfluxDB line protocol (measurement `tilt`)
    LineProtocol,
}

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Serialization format
    pub format: NetworkFormat,
}

impl NetworkSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let format = match params.get("format").map(String::as_str) {
            Some("line_protocol") => NetworkFormat::LineProtocol,
            Some("json") | None => NetworkFormat::Json,
            Some(other) => return Err(format!("unknown format '{}'", other)),
        };

        Ok(Self { addr, format })
    }
}

/// Sink that sends readings over UDP
pub struct NetworkSink {
    name: String,
    enabled: bool,
    config: NetworkSinkConfig,
    socket: Option<UdpSocket>,
}

impl NetworkSink {
    /// Create a new NetworkSink; the socket is bound by `start`
    pub fn new(name: impl Into<String>, config: NetworkSinkConfig) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            config,
            socket: None,
        }
    }

    /// Create from params (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, String> {
        let config = NetworkSinkConfig::from_params(params)?;
        Ok(Self::new(name, config))
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn serialize_reading(&self, reading: &Reading) -> Result<Vec<u8>, String> {
        match self.config.format {
            NetworkFormat::Json => {
                serde_json::to_vec(reading).map_err(|e| format!("json error: {}", e))
            }
            NetworkFormat::LineProtocol => Ok(line_protocol(reading).into_bytes()),
        }
    }

    async fn connect(&self) -> std::io::Result<UdpSocket> {
        let bind_addr: SocketAddr = if self.config.addr.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(&self.config.addr).await?;
        Ok(socket)
    }
}

/// Render a reading as one line-protocol point
pub fn line_protocol(reading: &Reading) -> String {
    let mut line = format!(
        "tilt,color={},name={} temp_f={},temp_c={:.3},gravity={:.3},plato={:.3}",
        reading.color(),
        escape_tag(reading.name()),
        reading.temp_fahrenheit(),
        reading.temp_celsius(),
        reading.gravity(),
        reading.degrees_plato(),
    );
    if let Some(abv) = reading.alcohol_by_volume() {
        line.push_str(&format!(",abv={abv:.3}"));
    }
    if let Some(nanos) = reading.timestamp().timestamp_nanos_opt() {
        line.push_str(&format!(" {nanos}"));
    }
    line
}

fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl ReadingSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    #[instrument(name = "network_sink_start", skip(self), fields(sink = %self.name))]
    async fn start(&mut self) -> Result<Option<String>, SinkError> {
        let socket = self
            .connect()
            .await
            .map_err(|e| SinkError::failed(&self.name, e.to_string()))?;
        self.socket = Some(socket);

        debug!(sink = %self.name, target = %self.config.addr, "NetworkSink connected");
        Ok(Some(format!("sending to udp://{}", self.config.addr)))
    }

    #[instrument(
        name = "network_sink_update",
        skip(self, reading),
        fields(sink = %self.name, color = %reading.color())
    )]
    async fn update(&mut self, reading: &Reading) -> Result<(), SinkError> {
        let data = self
            .serialize_reading(reading)
            .map_err(|e| SinkError::failed(&self.name, e))?;
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| SinkError::failed(&self.name, "socket not connected"))?;

        let sent = socket
            .send(&data)
            .await
            .map_err(|e| SinkError::failed(&self.name, e.to_string()))?;
        debug!(sink = %self.name, bytes = sent, "Sent");
        Ok(())
    }
}
