//! Scanner-side access to the published file

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use contracts::{ContractError, PublishedState};
use metrics::counter;
use tracing::{debug, trace};

use crate::lock::{AdvisoryLock, LockMode};

/// Reads the shared file under a shared lock
#[derive(Debug, Clone)]
pub struct PublishedReader {
    path: PathBuf,
}

impl PublishedReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the current state.
    ///
    /// `Ok(None)` means "nothing usable this cycle": the file does not exist
    /// yet, the writer holds the lock, the file is empty, or its body does
    /// not decode.
    pub fn try_read(&self) -> Result<Option<PublishedState>, ContractError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "published file not created yet");
                skipped("missing");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut body = Vec::new();
        {
            let Some(guard) = AdvisoryLock::try_acquire(&file, LockMode::Shared)? else {
                debug!(path = %self.path.display(), "published file locked by writer");
                skipped("locked");
                return Ok(None);
            };
            guard.file().read_to_end(&mut body)?;
        }

        if body.is_empty() {
            skipped("empty");
            return Ok(None);
        }

        match PublishedState::decode(&body) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "published file not decodable");
                skipped("undecodable");
                Ok(None)
            }
        }
    }
}

fn skipped(reason: &'static str) {
    counter!("sbscan_reads_skipped_total", "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Field;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let reader = PublishedReader::new(dir.path().join("absent.json"));
        assert_eq!(reader.try_read().unwrap(), None);
    }

    #[test]
    fn test_empty_and_garbage_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmea.json");
        let reader = PublishedReader::new(&path);

        fs::write(&path, b"").unwrap();
        assert_eq!(reader.try_read().unwrap(), None);

        fs::write(&path, br#"{"latitude": ["4807"#).unwrap();
        assert_eq!(reader.try_read().unwrap(), None);
    }

    #[test]
    fn test_locked_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmea.json");
        fs::write(&path, br#"{"speed": ["5.0", 1.0]}"#).unwrap();

        let writer = File::open(&path).unwrap();
        let guard = AdvisoryLock::try_acquire(&writer, LockMode::Exclusive)
            .unwrap()
            .unwrap();

        let reader = PublishedReader::new(&path);
        assert_eq!(reader.try_read().unwrap(), None);

        drop(guard);
        let state = reader.try_read().unwrap().unwrap();
        assert_eq!(state.get(Field::Speed).unwrap().value, "5.0");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmea.json");
        fs::write(&path, br#"{"speed": ["5.0", 1.0], "heave": ["0.2", 1.0]}"#).unwrap();

        let state = PublishedReader::new(&path).try_read().unwrap().unwrap();
        assert_eq!(state.len(), 1);
    }
}
