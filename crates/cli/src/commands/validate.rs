//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RelayConfig, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    simulate: bool,
    queue_capacity: usize,
    device_profiles: usize,
    sink_count: usize,
    enabled_sinks: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    simulate: config.scan.simulate,
                    queue_capacity: config.queue.capacity,
                    device_profiles: config.devices.len(),
                    sink_count: config.sinks.len(),
                    enabled_sinks: config.sinks.iter().filter(|s| s.enabled).count(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RelayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.sinks.is_empty() {
        warnings.push("No sinks configured - readings will be discarded".to_string());
    } else if config.sinks.iter().all(|s| !s.enabled) {
        warnings.push("All sinks are disabled - readings will be discarded".to_string());
    }

    if config.queue.idle_sleep_ms > 0 && config.queue.capacity == 1 {
        warnings.push(
            "queue.capacity = 1 with an idle sleep drops most readings between polls".to_string(),
        );
    }

    let prometheus_sinks = config
        .sinks
        .iter()
        .filter(|s| s.enabled && s.sink_type == SinkType::Prometheus)
        .count();
    if prometheus_sinks > 1 {
        warnings.push(format!(
            "{prometheus_sinks} prometheus sinks write the same gauges"
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            let source = if summary.simulate { "synthetic" } else { "bluetooth" };
            println!("\n  Source: {}", source);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Device profiles: {}", summary.device_profiles);
            println!(
                "  Sinks: {} ({} enabled)",
                summary.sink_count, summary.enabled_sinks
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
