//! PublisherWorker - snapshot to shared file

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{ContractError, PublishedState, Worker};
use ingestion::Snapshot;
use tracing::{debug, info, instrument, trace, warn};

use crate::backoff::{Backoff, FixedBackoff};
use crate::lock::{AdvisoryLock, LockMode};
use crate::metrics::PublisherMetrics;

/// Publisher settings
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Shared file rewritten on every publish
    pub output_file: PathBuf,

    /// Longest idle wait between two drains
    pub interval: Duration,
}

impl PublisherConfig {
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
            interval: Duration::from_millis(100),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Drains the snapshot and rewrites the shared file under an exclusive lock.
///
/// A drained copy that could not be written (lock held by a reader) is kept
/// and retried after the backoff delay; the snapshot is not drained again
/// until it is out.
pub struct PublisherWorker {
    name: String,
    config: PublisherConfig,
    file: File,
    snapshot: Arc<Snapshot>,
    backoff: Box<dyn Backoff>,
    pending: Option<PublishedState>,
    attempts: u32,
    metrics: Arc<PublisherMetrics>,
}

impl PublisherWorker {
    /// Create (or truncate) the output file and build the worker.
    ///
    /// Failing to open the file is a startup error.
    #[instrument(name = "publisher_open", skip(snapshot), fields(path = %config.output_file.display()))]
    pub fn open(config: PublisherConfig, snapshot: Arc<Snapshot>) -> Result<Self, ContractError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&config.output_file)?;

        info!(interval_ms = config.interval.as_millis() as u64, "publisher ready");

        Ok(Self {
            name: "writer".to_string(),
            backoff: Box::new(FixedBackoff::new(config.interval)),
            config,
            file,
            snapshot,
            pending: None,
            attempts: 0,
            metrics: Arc::new(PublisherMetrics::new()),
        })
    }

    /// Replace the retry policy
    pub fn with_backoff(mut self, backoff: Box<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn metrics(&self) -> Arc<PublisherMetrics> {
        self.metrics.clone()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Write `state` if the lock is free.
    ///
    /// # Errors
    /// `LockUnavailable` while a reader holds the file; I/O failures otherwise.
    fn try_publish(&self, state: &PublishedState) -> Result<(), ContractError> {
        let Some(guard) = AdvisoryLock::try_acquire(&self.file, LockMode::Exclusive)? else {
            return Err(ContractError::LockUnavailable {
                path: self.config.output_file.display().to_string(),
            });
        };

        let body = state.encode()?;
        let mut file = guard.file();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&body)?;
        file.flush()?;
        drop(guard);

        self.metrics.record_publish(body.len(), state.len());
        trace!(bytes = body.len(), fields = state.len(), "snapshot published");
        Ok(())
    }
}

impl Worker for PublisherWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self) -> Result<(), ContractError> {
        if self.pending.is_none() {
            self.pending = self.snapshot.drain_if_dirty();
        }

        if let Some(state) = self.pending.take() {
            match self.try_publish(&state) {
                Ok(()) => {
                    self.attempts = 0;
                    self.backoff.reset();
                }
                Err(e @ ContractError::LockUnavailable { .. }) => {
                    self.attempts += 1;
                    self.metrics.record_contention();
                    debug!(error = %e, attempt = self.attempts, "retrying publish");
                    self.pending = Some(state);
                    thread::sleep(self.backoff.delay(self.attempts));
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        self.snapshot.wait_dirty(self.config.interval);
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(state) = self.pending.take() {
            match self.try_publish(&state) {
                Ok(()) => debug!("final snapshot published"),
                Err(e @ ContractError::LockUnavailable { .. }) => {
                    debug!(error = %e, "final snapshot dropped")
                }
                Err(e) => warn!(error = %e, "final publish failed"),
            }
        }
        let stats = self.metrics.snapshot();
        info!(
            path = %self.config.output_file.display(),
            publishes = stats.publishes,
            contended = stats.contended,
            bytes = stats.bytes_written,
            "publisher stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Field, Reading};
    use std::fs;
    use tempfile::TempDir;

    fn merge(snapshot: &Snapshot, field: Field, value: &str, ts: f64) {
        let update = Snapshot::update_from([Reading::new(field, value, ts)]);
        snapshot.try_merge(update).unwrap();
    }

    fn worker(dir: &TempDir, snapshot: Arc<Snapshot>) -> PublisherWorker {
        let config = PublisherConfig::new(dir.path().join("nmea.json"))
            .with_interval(Duration::from_millis(5));
        PublisherWorker::open(config, snapshot).unwrap()
    }

    #[test]
    fn test_open_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmea.json");
        fs::write(&path, b"stale contents").unwrap();

        let _worker = worker(&dir, Arc::new(Snapshot::new()));
        assert_eq!(fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_publishes_full_state() {
        let dir = TempDir::new().unwrap();
        let snapshot = Arc::new(Snapshot::new());
        let mut w = worker(&dir, snapshot.clone());

        merge(&snapshot, Field::Latitude, "4807.038", 10.0);
        w.step().unwrap();
        merge(&snapshot, Field::DepthMeters, "3.2", 11.0);
        w.step().unwrap();

        let body = fs::read(dir.path().join("nmea.json")).unwrap();
        let state = PublishedState::decode(&body).unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.get(Field::Latitude).unwrap().timestamp, 10.0);
        assert_eq!(w.metrics().snapshot().publishes, 2);
        assert!(!snapshot.is_dirty());
    }

    #[test]
    fn test_shorter_body_leaves_no_tail() {
        let dir = TempDir::new().unwrap();
        let snapshot = Arc::new(Snapshot::new());
        let mut w = worker(&dir, snapshot.clone());

        merge(&snapshot, Field::Waypoint, "A-VERY-LONG-WAYPOINT-NAME", 1.0);
        w.step().unwrap();
        merge(&snapshot, Field::Waypoint, "B", 2.0);
        w.step().unwrap();

        let body = fs::read(dir.path().join("nmea.json")).unwrap();
        let state = PublishedState::decode(&body).unwrap();
        assert_eq!(state.get(Field::Waypoint).unwrap().value, "B");
    }

    #[test]
    fn test_retries_while_reader_holds_lock() {
        let dir = TempDir::new().unwrap();
        let snapshot = Arc::new(Snapshot::new());
        let mut w = worker(&dir, snapshot.clone())
            .with_backoff(Box::new(FixedBackoff::new(Duration::from_millis(1))));

        let reader = File::open(dir.path().join("nmea.json")).unwrap();
        let shared = AdvisoryLock::try_acquire(&reader, LockMode::Shared)
            .unwrap()
            .unwrap();

        merge(&snapshot, Field::Speed, "5.0", 1.0);
        w.step().unwrap();
        w.step().unwrap();
        assert!(w.has_pending());
        assert_eq!(w.metrics().snapshot().contended, 2);
        assert_eq!(w.metrics().snapshot().publishes, 0);

        drop(shared);
        w.step().unwrap();
        assert!(!w.has_pending());
        assert_eq!(w.metrics().snapshot().publishes, 1);
    }

    #[test]
    fn test_contended_publish_reports_lock_unavailable() {
        let dir = TempDir::new().unwrap();
        let w = worker(&dir, Arc::new(Snapshot::new()));
        let state = PublishedState::new(Default::default());

        let reader = File::open(dir.path().join("nmea.json")).unwrap();
        let shared = AdvisoryLock::try_acquire(&reader, LockMode::Shared)
            .unwrap()
            .unwrap();

        let err = w.try_publish(&state).unwrap_err();
        assert!(matches!(err, ContractError::LockUnavailable { ref path } if path.ends_with("nmea.json")));
        assert!(!err.is_fatal());

        drop(shared);
        w.try_publish(&state).unwrap();
    }
}
