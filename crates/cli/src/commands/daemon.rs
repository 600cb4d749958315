//! `nmead` entry point.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, DaemonConfig, SourceConfig};
use contracts::Worker;
use ingestion::{SentenceTemplates, SerialLineSource, Snapshot, SourceWorker};
use publisher::{PublisherConfig, PublisherWorker};
use tracing::info;

use super::shutdown_signal;
use crate::supervisor::Supervisor;

/// Load the configuration and run the daemon until a signal or a fatal error
pub async fn run_daemon(config_path: &Path, dry_run: bool) -> Result<()> {
    info!(config = %config_path.display(), "Loading configuration");
    let config = ConfigLoader::load_daemon(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        println!("{}", ConfigLoader::to_toml(&config)?);
        return Ok(());
    }

    // Every device and the output file must open before any thread starts
    let snapshot = Arc::new(Snapshot::new());
    let workers = build_daemon_workers(&config, snapshot)?;

    let mut supervisor = Supervisor::new();
    for worker in workers {
        supervisor.spawn(worker)?;
    }
    info!(
        gps = %config.gps.port,
        sounder = %config.sounder.port,
        output = %config.writer.output_file.display(),
        "nmead started"
    );

    let report = supervisor.run_until(shutdown_signal()).await;
    report.log_summary();
    report.into_result()?;

    info!("nmead finished");
    Ok(())
}

/// Open the writer and both serial sources
pub fn build_daemon_workers(
    config: &DaemonConfig,
    snapshot: Arc<Snapshot>,
) -> Result<Vec<Box<dyn Worker>>> {
    let publisher_config =
        PublisherConfig::new(&config.writer.output_file).with_interval(config.writer.interval);
    let writer = PublisherWorker::open(publisher_config, snapshot.clone())
        .context("Failed to open output file")?;

    let mut workers: Vec<Box<dyn Worker>> = vec![Box::new(writer)];
    for source in config.sources() {
        workers.push(Box::new(open_source(source, snapshot.clone())?));
    }
    Ok(workers)
}

fn open_source(config: &SourceConfig, snapshot: Arc<Snapshot>) -> Result<SourceWorker> {
    let line_source = SerialLineSource::open(&config.port, config.baud, config.read_timeout)
        .with_context(|| format!("Failed to open {} port {}", config.name, config.port))?;
    let templates = SentenceTemplates::standard().without(&config.disable_nmea);

    Ok(SourceWorker::new(
        config.name.clone(),
        Box::new(line_source),
        templates,
        config.check_checksums,
        snapshot,
    ))
}
