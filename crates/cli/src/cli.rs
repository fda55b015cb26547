//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tilt Relay - forwards Tilt hydrometer broadcasts to configured sinks
#[derive(Parser, Debug)]
#[command(
    name = "tilt-relay",
    author,
    version,
    about = "Tilt hydrometer BLE relay",
    long_about = "Listens for Tilt hydrometer iBeacon broadcasts, turns them into readings\n\
                  and fans each reading out to the configured sinks.\n\n\
                  Without a bluetooth adapter, --simulate emits a synthetic device."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TILT_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TILT_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default filter directive derived from `-v` / `-q`
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan for hydrometers and dispatch readings
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the identity table and configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "TILT_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use the synthetic source instead of the bluetooth adapter
    #[arg(long, env = "TILT_RELAY_SIMULATE")]
    pub simulate: bool,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, env = "TILT_RELAY_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Override the ingest queue capacity
    #[arg(long, env = "TILT_RELAY_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "TILT_RELAY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without scanning
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "tilt-relay.toml", env = "TILT_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; only the identity table is shown when omitted
    #[arg(short, long, env = "TILT_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from([
            "tilt-relay",
            "-v",
            "run",
            "--simulate",
            "--timeout",
            "5",
            "--queue-capacity",
            "1",
        ])
        .unwrap();

        assert_eq!(cli.log_level(), "debug");
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.simulate);
        assert_eq!(args.timeout, Some(5));
        assert_eq!(args.queue_capacity, Some(1));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["tilt-relay", "-q", "-v", "info"]).is_err());

        let cli = Cli::try_parse_from(["tilt-relay", "-q", "info"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
    }
}
