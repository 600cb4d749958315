//! `sbscan` entry point.

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, ScannerConfig};
use publisher::PublishedReader;
use recorder::{IngestionSession, ScannerWorker, SessionConfig, SqliteStore};
use tracing::info;

use super::shutdown_signal;
use crate::supervisor::Supervisor;

/// Load the configuration and record positions until a signal or a fatal error
pub async fn run_scanner(config_path: &Path, dry_run: bool) -> Result<()> {
    info!(config = %config_path.display(), "Loading configuration");
    let config = ConfigLoader::load_scanner(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        println!("{}", ConfigLoader::to_toml(&config)?);
        return Ok(());
    }

    let worker = build_scanner_worker(&config)?;
    let mut supervisor = Supervisor::new();
    supervisor.spawn(Box::new(worker))?;
    info!(
        db = %config.db_file.display(),
        nmea_file = %config.nmea_file.display(),
        "sbscan started"
    );

    let report = supervisor.run_until(shutdown_signal()).await;
    report.log_summary();
    report.into_result()?;

    info!("sbscan finished");
    Ok(())
}

/// Recording policy derived from the scanner configuration
pub fn session_config(config: &ScannerConfig) -> SessionConfig {
    SessionConfig {
        min_speed_knots: config.minspeed,
        pause_on_stop: config.pause_on_stop,
        commit_interval: config.commit_interval,
        log_interval: config.log_interval(),
    }
}

/// Open the database, start a session and wire it to the published file
pub fn build_scanner_worker(config: &ScannerConfig) -> Result<ScannerWorker<SqliteStore>> {
    let store = SqliteStore::open(&config.db_file)
        .with_context(|| format!("Failed to open database {}", config.db_file.display()))?;
    let session = IngestionSession::open(store, session_config(config))
        .context("Failed to start recording session")?;

    Ok(ScannerWorker::new(
        PublishedReader::new(&config.nmea_file),
        session,
        config.polling_interval,
    ))
}
