//! # Publisher
//!
//! Cross-process hand-off of the merged snapshot.
//!
//! Responsibilities:
//! - Advisory `flock(2)` locking of the shared file (exclusive writer,
//!   shared readers, never blocking)
//! - Periodically draining the `Snapshot` and rewriting the file in full
//! - Reading the file back on the scanner side
//!
//! The shared file is both the channel and the synchronization primitive.
//! Whoever fails to take the lock sleeps and tries again; the lock is held
//! only while the body is written or read.

#[cfg(not(unix))]
compile_error!("the publisher relies on flock(2) and only builds on unix targets");

mod backoff;
mod lock;
mod metrics;
mod reader;
mod worker;

pub use backoff::{Backoff, FixedBackoff};
pub use lock::{AdvisoryLock, LockGuard, LockMode};
pub use metrics::{PublisherMetrics, PublisherSnapshot};
pub use reader::PublishedReader;
pub use worker::{PublisherConfig, PublisherWorker};
