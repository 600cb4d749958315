//! sbscan - records vessel positions from the nmead published file

use anyhow::Result;
use clap::Parser;
use tracing::error;

use nmea_cli::cli::SbscanCli;
use nmea_cli::{commands, observability_config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = SbscanCli::parse();
    observability::init_with_config(observability_config(&cli.logging))?;

    let result = commands::run_scanner(&cli.config, cli.dry_run).await;
    if let Err(ref e) = result {
        error!(error = %format!("{e:#}"), "sbscan exited with error");
    }
    result
}
