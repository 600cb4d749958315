//! Supervisor loop and thread management.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ContractError, Worker};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::report::{SupervisorReport, WorkerExit};

/// Owns the worker threads of one process
pub struct Supervisor {
    token: CancellationToken,
    handles: Vec<(String, JoinHandle<WorkerExit>)>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Token cancelled on shutdown or on the first fatal worker failure
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Start a worker on a dedicated named thread
    pub fn spawn(&mut self, worker: Box<dyn Worker>) -> Result<()> {
        let name = worker.name().to_string();
        let token = self.token.clone();
        let handle = thread::Builder::new()
            .name(format!("worker-{name}"))
            .spawn(move || run_worker(worker, token))
            .with_context(|| format!("Failed to spawn worker thread '{name}'"))?;
        debug!(worker = %name, "worker thread started");
        self.handles.push((name, handle));
        Ok(())
    }

    /// Wait for `shutdown` or a fatal worker failure, then join every worker.
    pub async fn run_until<F>(self, shutdown: F) -> SupervisorReport
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let token = self.token.clone();

        let signalled = tokio::select! {
            _ = shutdown => {
                warn!("Received shutdown signal, stopping workers...");
                token.cancel();
                true
            }
            _ = token.cancelled() => {
                error!("A worker failed, stopping the remaining workers...");
                false
            }
        };

        let handles = self.handles;
        let exits = match tokio::task::spawn_blocking(move || join_all(handles)).await {
            Ok(exits) => exits,
            Err(e) => {
                error!(error = %e, "join task failed");
                Vec::new()
            }
        };

        SupervisorReport {
            exits,
            signalled,
            duration: started.elapsed(),
        }
    }
}

fn join_all(handles: Vec<(String, JoinHandle<WorkerExit>)>) -> Vec<WorkerExit> {
    handles
        .into_iter()
        .map(|(name, handle)| {
            handle.join().unwrap_or_else(|payload| WorkerExit {
                error: Some(ContractError::WorkerPanicked {
                    worker: name.clone(),
                    message: panic_message(payload.as_ref()),
                }),
                name,
                steps: 0,
            })
        })
        .collect()
}

/// Step `worker` until `token` is cancelled or a fatal failure occurs.
///
/// `shutdown` runs exactly once on every exit path. A failure cancels the
/// token so sibling workers stop as well.
pub fn run_worker(mut worker: Box<dyn Worker>, token: CancellationToken) -> WorkerExit {
    let name = worker.name().to_string();
    let mut steps = 0u64;
    let mut failure = None;

    info!(worker = %name, "worker running");
    while !token.is_cancelled() {
        match panic::catch_unwind(AssertUnwindSafe(|| worker.step())) {
            Ok(Ok(())) => steps += 1,
            Ok(Err(e)) if !e.is_fatal() => {
                debug!(worker = %name, error = %e, "transient worker error");
                steps += 1;
            }
            Ok(Err(e)) => {
                error!(worker = %name, error = %e, "fatal worker error");
                failure = Some(e);
                break;
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(worker = %name, panic = %message, "worker panicked");
                failure = Some(ContractError::WorkerPanicked {
                    worker: name.clone(),
                    message,
                });
                break;
            }
        }
    }

    if failure.is_some() {
        token.cancel();
    }

    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| worker.shutdown())) {
        let message = panic_message(payload.as_ref());
        error!(worker = %name, panic = %message, "worker panicked during shutdown");
        failure.get_or_insert(ContractError::WorkerPanicked {
            worker: name.clone(),
            message,
        });
    }

    info!(worker = %name, steps, failed = failure.is_some(), "worker exited");
    WorkerExit {
        name,
        steps,
        error: failure,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
