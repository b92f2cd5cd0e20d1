//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Proximity Guard - ultrasonic distance monitor with photo capture
#[derive(Parser, Debug)]
#[command(
    name = "proximity-guard",
    author,
    version,
    about = "Ultrasonic proximity guard",
    long_about = "Measures obstacle distance on a fixed period, drives an RGB LED, buzzer \n\
                  and text display by zone, and uploads a photo with the measurement \n\
                  every time something enters the critical zone."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PROXIMITY_GUARD_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PROXIMITY_GUARD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the guard until interrupted
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "PROXIMITY_GUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Upload records to this collector URL (switches the sink to HTTP)
    #[arg(long, env = "PROXIMITY_GUARD_URL")]
    pub url: Option<String>,

    /// Override the sensing period in milliseconds
    #[arg(long, env = "PROXIMITY_GUARD_PERIOD_MS")]
    pub period_ms: Option<u64>,

    /// Stop after this many sensing cycles (0 = unlimited)
    #[arg(long, default_value = "0", env = "PROXIMITY_GUARD_MAX_CYCLES")]
    pub max_cycles: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "PROXIMITY_GUARD_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PROXIMITY_GUARD_METRICS_PORT")]
    pub metrics_port: u16,

    /// Seed for simulated noise and dropouts
    #[arg(long, env = "PROXIMITY_GUARD_SEED")]
    pub seed: Option<u64>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "guard.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "guard.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the simulated distance profile
    #[arg(long)]
    pub profile: bool,
}

impl Cli {
    /// Logging setup for the global flags; metrics are started by `run`
    pub fn observability(&self) -> observability::ObservabilityConfig {
        let format = match self.log_format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        };
        observability::ObservabilityConfig::from_verbosity(format, self.verbose, self.quiet)
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
