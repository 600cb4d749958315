//! Command implementations for the two binaries.

mod daemon;
mod scanner;
mod signal;

pub use daemon::{build_daemon_workers, run_daemon};
pub use scanner::{build_scanner_worker, run_scanner, session_config};
pub use signal::shutdown_signal;
