//! # NMEA CLI
//!
//! Entry points for the two processes:
//! - `nmead`: reads the GPS and sounder serial ports and publishes the
//!   merged snapshot to a shared file
//! - `sbscan`: polls that file and records positions into SQLite
//!
//! Both run their workers on OS threads under a `Supervisor`; the tokio
//! runtime only waits for signals or a fatal worker error.

pub mod cli;
pub mod commands;
pub mod supervisor;

use observability::ObservabilityConfig;

/// Build observability settings from the common logging flags
pub fn observability_config(logging: &cli::LoggingArgs) -> ObservabilityConfig {
    let default_log_level = if logging.quiet {
        "warn"
    } else {
        match logging.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_format: logging.log_format.into(),
        metrics_port: (logging.metrics_port != 0).then_some(logging.metrics_port),
        default_log_level: default_log_level.to_string(),
        log_file: logging.log_file.clone(),
    }
}
