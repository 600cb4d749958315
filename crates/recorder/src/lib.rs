//! # Recorder
//!
//! The scanner side: turns the stream of published snapshots into durable
//! position records.
//!
//! Responsibilities:
//! - `IngestionSession`: warm-up, pause/resume on speed, monotonic gating,
//!   depth resolution, batched commits
//! - `SqliteStore`: schema migrations and explicit transactions
//! - `ScannerWorker`: polling loop around the session

mod depth;
mod migrations;
mod scanner;
mod session;
mod sqlite;

pub use depth::{resolve_depth, ResolvedDepth, FATHOMS_TO_METERS, FEET_TO_METERS};
pub use scanner::ScannerWorker;
pub use session::{IngestionSession, Outcome, SessionConfig};
pub use sqlite::SqliteStore;
