//! ScannerWorker - polls the published file and feeds the session

use std::thread;
use std::time::Duration;

use contracts::{ContractError, PositionStore, Worker};
use publisher::{Backoff, FixedBackoff, PublishedReader};
use tracing::{error, info, trace};

use crate::session::{IngestionSession, Outcome};

/// Drives one `IngestionSession` from the shared file.
///
/// Each step reads the file once, runs the session policy on what it got,
/// then sleeps the polling interval. Cycles where nothing could be read are
/// skipped silently.
pub struct ScannerWorker<S: PositionStore> {
    name: String,
    reader: PublishedReader,
    session: Option<IngestionSession<S>>,
    poll: Box<dyn Backoff>,
    skipped_in_a_row: u32,
    last_outcome: Option<Outcome>,
}

impl<S: PositionStore> ScannerWorker<S> {
    pub fn new(reader: PublishedReader, session: IngestionSession<S>, polling_interval: Duration) -> Self {
        info!(
            path = %reader.path().display(),
            session_id = session.session_id(),
            polling_ms = polling_interval.as_millis() as u64,
            "scanner worker created"
        );
        Self {
            name: "scanner".to_string(),
            reader,
            session: Some(session),
            poll: Box::new(FixedBackoff::new(polling_interval)),
            skipped_in_a_row: 0,
            last_outcome: None,
        }
    }

    /// Outcome of the most recent cycle that had data
    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }

    pub fn session(&self) -> Option<&IngestionSession<S>> {
        self.session.as_ref()
    }

    /// One read-and-observe cycle without the trailing sleep
    pub fn poll_once(&mut self) -> Result<Option<Outcome>, ContractError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        let Some(state) = self.reader.try_read()? else {
            self.skipped_in_a_row += 1;
            trace!(skipped = self.skipped_in_a_row, "no published state this cycle");
            return Ok(None);
        };
        self.skipped_in_a_row = 0;
        self.poll.reset();

        let outcome = session.observe(&state).inspect_err(|e| {
            error!(error = %e, "position store failure");
        })?;
        self.last_outcome = Some(outcome.clone());
        Ok(Some(outcome))
    }
}

impl<S: PositionStore> Worker for ScannerWorker<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self) -> Result<(), ContractError> {
        let delay = match self.poll_once()? {
            Some(_) => self.poll.delay(1),
            None => self.poll.delay(self.skipped_in_a_row.max(1)),
        };
        thread::sleep(delay);
        Ok(())
    }

    fn shutdown(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match session.finish() {
            Ok(summary) => info!(
                session_id = summary.session_id,
                positions = summary.positions,
                started_at = %summary.started_at,
                stopped_at = %summary.stopped_at,
                "scanner stopped"
            ),
            Err(e) => error!(error = %e, "failed to close session cleanly"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use crate::sqlite::SqliteStore;
    use std::fs;
    use tempfile::TempDir;

    const BODY: &str = r#"{
        "latitude": ["4807.038", 100.0], "NS": ["N", 100.0],
        "longitude": ["01131.000", 100.0], "EW": ["E", 100.0],
        "speed": ["5.5", 100.0], "track": ["084.4", 100.0],
        "depthm": ["4.0", 99.5]
    }"#;

    fn scanner(dir: &TempDir) -> ScannerWorker<SqliteStore> {
        let store = SqliteStore::open(dir.path().join("positions.db")).unwrap();
        let session = IngestionSession::open(store, SessionConfig::default()).unwrap();
        ScannerWorker::new(
            PublishedReader::new(dir.path().join("nmea.json")),
            session,
            Duration::from_millis(1),
        )
    }

    #[test]
    fn test_missing_file_skips_cycle() {
        let dir = TempDir::new().unwrap();
        let mut w = scanner(&dir);
        assert_eq!(w.poll_once().unwrap(), None);
        w.step().unwrap();
        assert_eq!(w.last_outcome(), None);
    }

    #[test]
    fn test_records_once_per_fix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("nmea.json"), BODY).unwrap();
        let mut w = scanner(&dir);

        assert_eq!(w.poll_once().unwrap(), Some(Outcome::Recorded));
        assert_eq!(w.poll_once().unwrap(), Some(Outcome::Unchanged));
        assert_eq!(w.session().unwrap().positions(), 1);
    }

    #[test]
    fn test_shutdown_closes_session() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("nmea.json"), BODY).unwrap();
        let mut w = scanner(&dir);
        w.step().unwrap();
        let sid = w.session().unwrap().session_id();
        w.shutdown();
        assert!(w.session().is_none());

        let store = SqliteStore::open(dir.path().join("positions.db")).unwrap();
        assert_eq!(store.position_count(sid).unwrap(), 1);
        let (_, stopped) = store.session_times(sid).unwrap().unwrap();
        assert!(stopped.is_some());
    }
}
