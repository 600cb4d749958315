//! SQLite position store

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use contracts::{ContractError, PositionRecord, PositionStore, SessionId};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, instrument};

use crate::migrations::run_migrations;

/// Map a rusqlite error to a `StorageOperation` for `operation`
pub(crate) fn storage(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> ContractError {
    move |e| ContractError::storage(operation, e.to_string())
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Position store backed by one SQLite file.
///
/// Inserts accumulate in an explicit transaction that is opened lazily and
/// only made durable by `commit`.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database and bring its schema up to date
    #[instrument(name = "sqlite_open", skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(storage("open"))?;
        let store = Self::init(conn, path)?;
        info!("position store ready");
        Ok(store)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self, ContractError> {
        let conn = Connection::open_in_memory().map_err(storage("open"))?;
        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(mut conn: Connection, path: PathBuf) -> Result<Self, ContractError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(storage("enable foreign keys"))?;
        run_migrations(&mut conn)?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether writes are waiting for a commit
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn begin_if_needed(&self) -> Result<(), ContractError> {
        if self.conn.is_autocommit() {
            self.conn
                .execute_batch("BEGIN")
                .map_err(storage("begin"))?;
        }
        Ok(())
    }

    /// Number of positions stored for a session (committed or not, as seen
    /// by this connection)
    pub fn position_count(&self, session_id: SessionId) -> Result<u64, ContractError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM positions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .map_err(storage("count positions"))?;
        Ok(count.max(0) as u64)
    }

    /// Start and stop times of a session, if it exists
    pub fn session_times(
        &self,
        session_id: SessionId,
    ) -> Result<Option<(String, Option<String>)>, ContractError> {
        self.conn
            .query_row(
                "SELECT starttime, stoptime FROM sessions WHERE id = ?1",
                params![session_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage("read session"))
    }
}

impl PositionStore for SqliteStore {
    fn open_session(&mut self, started_at: DateTime<Utc>) -> Result<SessionId, ContractError> {
        self.begin_if_needed()?;
        self.conn
            .execute(
                "INSERT INTO sessions (starttime) VALUES (?1)",
                params![rfc3339(started_at)],
            )
            .map_err(storage("open session"))?;
        let id = self.conn.last_insert_rowid();
        debug!(session_id = id, "session row created");
        Ok(id)
    }

    fn insert_position(&mut self, record: &PositionRecord) -> Result<(), ContractError> {
        self.begin_if_needed()?;
        self.conn
            .execute(
                "INSERT INTO positions
                    (passing_time, lat, lon, speed, heading, depth, time_between, session_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.passing_time,
                    record.latitude,
                    record.longitude,
                    record.speed_knots,
                    record.heading_degrees,
                    record.depth_meters,
                    record.depth_time_delta,
                    record.session_id,
                ],
            )
            .map_err(storage("insert position"))?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ContractError> {
        if !self.conn.is_autocommit() {
            self.conn
                .execute_batch("COMMIT")
                .map_err(storage("commit"))?;
        }
        Ok(())
    }

    fn close_session(
        &mut self,
        session_id: SessionId,
        stopped_at: DateTime<Utc>,
    ) -> Result<(), ContractError> {
        self.begin_if_needed()?;
        let updated = self
            .conn
            .execute(
                "UPDATE sessions SET stoptime = ?1 WHERE id = ?2",
                params![rfc3339(stopped_at), session_id],
            )
            .map_err(storage("close session"))?;
        if updated == 0 {
            return Err(ContractError::storage(
                "close session",
                format!("no session with id {session_id}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(session_id: SessionId, passing_time: f64) -> PositionRecord {
        PositionRecord {
            passing_time,
            latitude: "4807.038N".into(),
            longitude: "01131.000E".into(),
            speed_knots: 5.2,
            heading_degrees: Some(84.4),
            depth_meters: None,
            depth_time_delta: None,
            session_id,
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let start = Utc::now();
        let sid = store.open_session(start).unwrap();
        store.insert_position(&record(sid, 1.0)).unwrap();
        store.commit().unwrap();
        assert!(!store.in_transaction());

        store.close_session(sid, Utc::now()).unwrap();
        store.commit().unwrap();

        let (started, stopped) = store.session_times(sid).unwrap().unwrap();
        assert_eq!(started, rfc3339(start));
        assert!(stopped.is_some());
        assert_eq!(store.position_count(sid).unwrap(), 1);
    }

    #[test]
    fn test_rows_visible_to_other_connection_only_after_commit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("positions.db");
        let mut store = SqliteStore::open(&path).unwrap();
        let sid = store.open_session(Utc::now()).unwrap();
        store.commit().unwrap();

        store.insert_position(&record(sid, 1.0)).unwrap();
        store.insert_position(&record(sid, 2.0)).unwrap();
        assert!(store.in_transaction());

        let other = Connection::open(&path).unwrap();
        let count = |conn: &Connection| -> i64 {
            conn.query_row("SELECT COUNT(*) FROM positions", [], |row| row.get(0))
                .unwrap()
        };
        assert_eq!(count(&other), 0);

        store.commit().unwrap();
        assert_eq!(count(&other), 2);
    }

    #[test]
    fn test_nullable_columns_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let sid = store.open_session(Utc::now()).unwrap();
        let mut rec = record(sid, 3.5);
        rec.heading_degrees = None;
        rec.depth_meters = Some(3.048);
        rec.depth_time_delta = Some(0.25);
        store.insert_position(&rec).unwrap();

        let (heading, depth, delta): (Option<f64>, Option<f64>, Option<f64>) = store
            .conn
            .query_row(
                "SELECT heading, depth, time_between FROM positions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(heading, None);
        assert_eq!(depth, Some(3.048));
        assert_eq!(delta, Some(0.25));
    }

    #[test]
    fn test_position_requires_existing_session() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store.insert_position(&record(42, 1.0)).unwrap_err();
        assert!(matches!(err, ContractError::StorageOperation { .. }));
    }

    #[test]
    fn test_storage_error_carries_operation() {
        let err = storage("commit")(rusqlite::Error::InvalidQuery);
        match err {
            ContractError::StorageOperation { operation, .. } => assert_eq!(operation, "commit"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_close_unknown_session_fails() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.close_session(7, Utc::now()).is_err());
    }

    #[test]
    fn test_reopen_keeps_sessions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("positions.db");
        let first = {
            let mut store = SqliteStore::open(&path).unwrap();
            let sid = store.open_session(Utc::now()).unwrap();
            store.commit().unwrap();
            sid
        };

        let mut store = SqliteStore::open(&path).unwrap();
        let second = store.open_session(Utc::now()).unwrap();
        assert!(second > first);
    }
}
