//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::RelayConfig;
use tracing::{info, warn};

use super::load_config;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    match &args.config {
        Some(path) => info!(config = %path.display(), "Loading configuration"),
        None => info!("No configuration file given, using defaults"),
    }

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        simulate = config.scan.simulate,
        queue_capacity = config.queue.capacity,
        timeout_seconds = config.dispatch.timeout_seconds,
        sinks = config.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        relay: config,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    info!("Starting relay...");
    let stats = pipeline
        .run(setup_shutdown_signal())
        .await
        .context("Relay execution failed")?;

    info!(
        readings_queued = stats.ingestion.readings_queued,
        readings_dispatched = stats.dispatch.readings_dispatched,
        duration_secs = stats.duration.as_secs_f64(),
        "Relay finished"
    );
    stats.print_summary();

    Ok(())
}

fn apply_overrides(config: &mut RelayConfig, args: &RunArgs) {
    if args.simulate {
        info!("Using synthetic source from CLI");
        config.scan.simulate = true;
    }
    if let Some(timeout) = args.timeout {
        info!(timeout_seconds = timeout, "Overriding run timeout from CLI");
        config.dispatch.timeout_seconds = timeout;
    }
    if let Some(capacity) = args.queue_capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        config.queue.capacity = capacity;
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping relay...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &RelayConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Scan:");
    if config.scan.simulate {
        println!(
            "  Source: synthetic (every {} ms)",
            config.scan.synthetic_interval_ms
        );
    } else {
        println!("  Source: bluetooth adapter #{}", config.scan.adapter_index);
    }

    println!("\nQueue:");
    println!("  Capacity: {}", config.queue.capacity);
    println!("  Remove wait: {} ms", config.queue.remove_wait_ms);
    println!("  Idle sleep: {} ms", config.queue.idle_sleep_ms);

    println!("\nValidity:");
    println!(
        "  Temperature: {}..={} °F",
        config.validity.temp_min_f, config.validity.temp_max_f
    );
    println!(
        "  Gravity: {}..={}",
        config.validity.gravity_min, config.validity.gravity_max
    );

    if !config.devices.is_empty() {
        println!("\nDevices ({}):", config.devices.len());
        for (color, profile) in &config.devices {
            println!(
                "  - {}: {} (OG {})",
                color,
                profile.name.as_deref().unwrap_or(color.as_str()),
                profile
                    .original_gravity
                    .map_or_else(|| "unset".to_string(), |og| format!("{og:.3}"))
            );
        }
    }

    println!("\nSinks ({}):", config.sinks.len());
    for sink in &config.sinks {
        let state = if sink.enabled { "" } else { " [disabled]" };
        match sink.rate_limit_seconds {
            Some(secs) if secs > 0.0 => println!(
                "  - {} ({:?}, every {}s){}",
                sink.name, sink.sink_type, secs, state
            ),
            _ => println!("  - {} ({:?}){}", sink.name, sink.sink_type, state),
        }
    }

    match config.dispatch.time_budget() {
        Some(budget) => println!("\nTimeout: {}s", budget.as_secs()),
        None => println!("\nTimeout: none"),
    }
    println!();
}
