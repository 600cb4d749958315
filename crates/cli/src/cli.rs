//! CLI argument definitions using clap.

use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

/// nmead - NMEA serial telemetry daemon
#[derive(Parser, Debug)]
#[command(
    name = "nmead",
    author,
    version,
    about = "Serial NMEA telemetry daemon",
    long_about = "Reads NMEA sentences from a GPS receiver and a depth sounder, merges \n\
                  the latest value of every field, and publishes the result to a \n\
                  shared JSON file guarded by an advisory lock."
)]
pub struct NmeadCli {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "/etc/nmead.toml", env = "NMEAD_CONFIG")]
    pub config: PathBuf,

    /// Validate configuration, print it, and exit
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// sbscan - position scanner
#[derive(Parser, Debug)]
#[command(
    name = "sbscan",
    author,
    version,
    about = "Records positions published by nmead into SQLite",
    long_about = "Polls the file published by nmead, records a position whenever the \n\
                  vessel is moving and the fix is new, and commits them to a SQLite \n\
                  database in batches."
)]
pub struct SbscanCli {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "/etc/sbscan.toml", env = "SBSCAN_CONFIG")]
    pub config: PathBuf,

    /// Validate configuration, print it, and exit
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Logging and metrics flags shared by both binaries
#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact", env = "NMEA_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "NMEA_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "NMEA_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
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
