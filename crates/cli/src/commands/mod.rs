//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::{RelayConfig, SinkConfig, SinkType};

/// Load the configuration file, or fall back to the built-in defaults
pub(crate) fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    let Some(path) = path else {
        return Ok(default_config());
    };

    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Defaults plus a single console sink
pub(crate) fn default_config() -> RelayConfig {
    RelayConfig {
        sinks: vec![SinkConfig {
            name: "console".to_string(),
            sink_type: SinkType::Log,
            enabled: true,
            rate_limit_seconds: None,
            params: HashMap::new(),
        }],
        ..RelayConfig::default()
    }
}
