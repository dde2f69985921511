//! Bounded background work queue.
//!
//! Fire-and-forget jobs (activity persistence) run on a fixed set of worker
//! tasks fed by a bounded channel. Submitting never waits: when the queue is
//! full the job is handed back to the caller, which decides how to report
//! the drop. Every job runs under a deadline, and [`BackgroundQueue::shutdown`]
//! closes the queue and waits a bounded time for it to drain.

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ActivityError;

/// A unit of background work.
pub type Job = BoxFuture<'static, ()>;

/// Why a job was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// Every slot in the queue is taken.
    Full,
    /// The queue has been shut down.
    Closed,
}

/// Fixed-size worker pool with a bounded queue.
pub struct BackgroundQueue {
    name: &'static str,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundQueue {
    /// Start `workers` tasks on the current tokio runtime.
    pub fn start(
        name: &'static str,
        workers: usize,
        capacity: usize,
        job_timeout: Duration,
    ) -> Result<Self, ActivityError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ActivityError::InitializationFailed(format!("{name}: {e}")))?;

        let (tx, rx) = mpsc::channel::<Job>(capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|index| {
                let rx = Arc::clone(&rx);
                runtime.spawn(async move {
                    loop {
                        let job = { rx.lock().await.recv().await };
                        let Some(job) = job else { break };
                        if tokio::time::timeout(job_timeout, job).await.is_err() {
                            tracing::warn!(
                                queue = name,
                                worker = index,
                                timeout_secs = job_timeout.as_secs(),
                                "Background job timed out"
                            );
                        }
                    }
                    tracing::debug!(queue = name, worker = index, "Background worker stopped");
                })
            })
            .collect();

        Ok(Self {
            name,
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
        })
    }

    /// Enqueue a job without waiting.
    pub fn submit(&self, job: Job) -> Result<(), Rejected> {
        let guard = self.sender.lock().map_err(|_| Rejected::Closed)?;
        let Some(sender) = guard.as_ref() else {
            return Err(Rejected::Closed);
        };
        sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Rejected::Full,
            mpsc::error::TrySendError::Closed(_) => Rejected::Closed,
        })
    }

    /// Stop accepting jobs and wait up to `grace` for queued ones to finish.
    ///
    /// Returns `false` if the deadline passed first; unfinished jobs are
    /// aborted. Calling it again is a no-op returning `true`.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let handles: Vec<JoinHandle<()>> = match self.workers.lock() {
            Ok(mut workers) => workers.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        if handles.is_empty() {
            return true;
        }

        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        let drained = tokio::time::timeout(grace, futures::future::join_all(handles))
            .await
            .is_ok();
        if !drained {
            tracing::warn!(queue = self.name, "Background queue did not drain before deadline");
            for abort in aborts {
                abort.abort();
            }
        }
        drained
    }
}
