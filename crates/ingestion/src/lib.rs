//! # Ingestion
//!
//! Serial NMEA ingestion for the daemon.
//!
//! Responsibilities:
//! - Hold the sentence template registry (with per-source disabled headers)
//! - Decode framed sentences into readings (checksum and arity checks)
//! - Merge readings from every source into the shared `Snapshot`
//! - Drive one `SourceWorker` per serial device
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{SentenceTemplates, SerialLineSource, Snapshot, SourceWorker};
//!
//! let snapshot = Arc::new(Snapshot::new());
//! let source = SerialLineSource::open("/dev/ttyUSB0", 4800, Duration::from_millis(50))?;
//! let worker = SourceWorker::new(
//!     "GPS",
//!     Box::new(source),
//!     SentenceTemplates::standard().without(["$GPRMB"]),
//!     true,
//!     snapshot.clone(),
//! );
//! ```

pub mod codec;
mod metrics;
mod snapshot;
mod sources;
mod templates;
mod worker;

// Re-exports
pub use codec::decode;
pub use contracts::{DecodeError, Reading};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use snapshot::{FieldUpdate, Snapshot};
pub use sources::{MAX_LINE_LEN, ReaderLineSource, ScriptedLineSource, SerialLineSource, WhenExhausted};
pub use templates::{SentenceTemplate, SentenceTemplates};
pub use worker::SourceWorker;
