//! nmead - serial NMEA telemetry daemon

use anyhow::Result;
use clap::Parser;
use tracing::error;

use nmea_cli::cli::NmeadCli;
use nmea_cli::{commands, observability_config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = NmeadCli::parse();
    observability::init_with_config(observability_config(&cli.logging))?;

    let result = commands::run_daemon(&cli.config, cli.dry_run).await;
    if let Err(ref e) = result {
        error!(error = %format!("{e:#}"), "nmead exited with error");
    }
    result
}
