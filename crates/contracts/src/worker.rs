//! Worker trait - unit of work driven by a supervisor loop

use crate::ContractError;

/// A long-running worker stepped by its supervisor.
///
/// The supervisor calls `step` once per iteration until cancellation or a
/// fatal error, then calls `shutdown` exactly once. A worker owns its
/// resources (devices, files, connections) and releases them in `shutdown`.
pub trait Worker: Send {
    /// Worker name (used for logging and thread names)
    fn name(&self) -> &str;

    /// Run one iteration. Must return within a bounded time.
    ///
    /// # Errors
    /// Only fatal conditions; transient ones are handled inside the step.
    fn step(&mut self) -> Result<(), ContractError>;

    /// Release owned resources
    fn shutdown(&mut self);
}
