//! Supervisor run report.

use std::time::Duration;

use anyhow::Result;
use contracts::ContractError;
use tracing::info;

/// How one worker ended
#[derive(Debug)]
pub struct WorkerExit {
    pub name: String,
    /// Completed steps, transient errors included
    pub steps: u64,
    /// Fatal error or panic that stopped the worker
    pub error: Option<ContractError>,
}

/// Result of a supervised run
#[derive(Debug)]
pub struct SupervisorReport {
    pub exits: Vec<WorkerExit>,
    /// Stopped by a signal rather than a worker failure
    pub signalled: bool,
    pub duration: Duration,
}

impl SupervisorReport {
    /// First worker that stopped with an error
    pub fn first_failure(&self) -> Option<&WorkerExit> {
        self.exits.iter().find(|exit| exit.error.is_some())
    }

    /// Log a one-line summary per worker
    pub fn log_summary(&self) {
        for exit in &self.exits {
            info!(
                worker = %exit.name,
                steps = exit.steps,
                error = ?exit.error.as_ref().map(ToString::to_string),
                "worker summary"
            );
        }
        info!(
            workers = self.exits.len(),
            duration_secs = self.duration.as_secs_f64(),
            signalled = self.signalled,
            "supervisor finished"
        );
    }

    /// Turn the first failure into an error so the process exits non-zero
    pub fn into_result(self) -> Result<()> {
        let failure = self
            .exits
            .into_iter()
            .find_map(|exit| exit.error.map(|e| (exit.name, e)));
        match failure {
            Some((name, e)) => Err(anyhow::Error::new(e).context(format!("worker '{name}' failed"))),
            None => Ok(()),
        }
    }
}
