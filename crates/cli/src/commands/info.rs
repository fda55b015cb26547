//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{RelayConfig, TiltColor};
use ingestion::IdentityTable;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Relay info for JSON output
#[derive(Serialize)]
struct RelayInfo {
    version: String,
    devices: Vec<DeviceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct DeviceInfo {
    color: TiltColor,
    uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_gravity: Option<f64>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit_seconds: Option<f64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration info");
            Some(load_config(Some(path))?)
        }
        None => None,
    };

    let relay_info = build_relay_info(&IdentityTable::standard(), config.as_ref());

    if args.json {
        let json =
            serde_json::to_string_pretty(&relay_info).context("Failed to serialize relay info")?;
        println!("{}", json);
    } else {
        print_relay_info(&relay_info);
    }

    Ok(())
}

fn build_relay_info(identity: &IdentityTable, config: Option<&RelayConfig>) -> RelayInfo {
    let devices = identity
        .entries()
        .into_iter()
        .map(|(color, id)| {
            let profile = config.and_then(|c| c.devices.get(&color));
            DeviceInfo {
                color,
                uuid: id.to_string(),
                name: profile.and_then(|p| p.name.clone()),
                original_gravity: profile.and_then(|p| p.original_gravity),
            }
        })
        .collect();

    let sinks = config
        .map(|c| {
            c.sinks
                .iter()
                .map(|s| SinkInfo {
                    name: s.name.clone(),
                    sink_type: format!("{:?}", s.sink_type),
                    enabled: s.enabled,
                    rate_limit_seconds: s.rate_limit_seconds,
                })
                .collect()
        })
        .unwrap_or_default();

    RelayInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        devices,
        sinks,
    }
}

fn print_relay_info(relay_info: &RelayInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Tilt Relay v{:<30}║", relay_info.version);
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🍺 Known devices ({})", relay_info.devices.len());
    for (i, device) in relay_info.devices.iter().enumerate() {
        let prefix = if i == relay_info.devices.len() - 1 {
            "└─"
        } else {
            "├─"
        };
        let mut line = format!("   {} {:<10} {}", prefix, device.color.as_str(), device.uuid);
        if let Some(ref name) = device.name {
            line.push_str(&format!("  \"{}\"", name));
        }
        if let Some(og) = device.original_gravity {
            line.push_str(&format!("  OG {:.3}", og));
        }
        println!("{}", line);
    }

    if !relay_info.sinks.is_empty() {
        println!("\n📤 Sinks ({})", relay_info.sinks.len());
        for (i, sink) in relay_info.sinks.iter().enumerate() {
            let prefix = if i == relay_info.sinks.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            let state = if sink.enabled { "" } else { " [disabled]" };
            println!("   {} {} ({}){}", prefix, sink.name, sink.sink_type, state);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DeviceProfile;

    #[test]
    fn test_identity_only() {
        let relay_info = build_relay_info(&IdentityTable::standard(), None);
        assert_eq!(relay_info.devices.len(), 9);
        assert!(relay_info.sinks.is_empty());

        let red = relay_info
            .devices
            .iter()
            .find(|d| d.color == TiltColor::Red)
            .unwrap();
        assert_eq!(red.uuid, "a495bb10-c5b1-4b44-b512-1370f02d74de");
    }

    #[test]
    fn test_profiles_and_sinks_merged() {
        let mut config = crate::commands::default_config();
        config.devices.insert(
            TiltColor::Green,
            DeviceProfile {
                name: Some("Pale Ale".to_string()),
                original_gravity: Some(1.052),
            },
        );

        let relay_info = build_relay_info(&IdentityTable::standard(), Some(&config));
        let green = relay_info
            .devices
            .iter()
            .find(|d| d.color == TiltColor::Green)
            .unwrap();
        assert_eq!(green.name.as_deref(), Some("Pale Ale"));
        assert_eq!(relay_info.sinks.len(), 1);

        let json = serde_json::to_value(&relay_info).unwrap();
        assert_eq!(json["sinks"][0]["name"], "console");
    }
}
