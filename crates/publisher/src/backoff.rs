//! Retry delay policy for lock contention

use std::time::Duration;

/// Delay between attempts to take a contended lock.
///
/// `attempt` counts consecutive failures, starting at 1.
pub trait Backoff: Send {
    fn delay(&mut self, attempt: u32) -> Duration;

    /// Called after a successful acquisition
    fn reset(&mut self);
}

/// Same delay for every attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    interval: Duration,
}

impl FixedBackoff {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl Backoff for FixedBackoff {
    fn delay(&mut self, _attempt: u32) -> Duration {
        self.interval
    }

    fn reset(&mut self) {}
}
