//! Worker supervision.
//!
//! Every worker runs on its own OS thread, stepping until the shared
//! cancellation token fires. A fatal error or panic in any worker cancels
//! the token so the others shut down too.

mod report;
mod runner;

pub use report::{SupervisorReport, WorkerExit};
pub use runner::{run_worker, Supervisor};
