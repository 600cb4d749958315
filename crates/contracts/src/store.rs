//! PositionStore trait - scanner persistence interface

use chrono::{DateTime, Utc};

use crate::{ContractError, PositionRecord, SessionId};

/// Durable, append-only position storage with explicit commits.
///
/// Writes between two `commit` calls may be lost on crash.
pub trait PositionStore: Send {
    /// Create a session row and return its id
    fn open_session(&mut self, started_at: DateTime<Utc>) -> Result<SessionId, ContractError>;

    /// Append one position
    fn insert_position(&mut self, record: &PositionRecord) -> Result<(), ContractError>;

    /// Make all pending writes durable
    fn commit(&mut self) -> Result<(), ContractError>;

    /// Record the session stop time
    fn close_session(
        &mut self,
        session_id: SessionId,
        stopped_at: DateTime<Utc>,
    ) -> Result<(), ContractError>;
}
