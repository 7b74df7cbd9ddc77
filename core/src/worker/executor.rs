//! Worker probe loop

use crate::target::Target;
use crate::traits::{Outcome, Prober};

use super::stats::Tally;

use std::sync::Arc;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

/// Worker probes the target in a loop: poll stop -> probe -> tally -> repeat
///
/// Workers are independent tokio tasks spawned by the Coordinator. Each owns
/// its Tally and its Prober outright; the only thing they share is the
/// immutable Target.
pub struct Worker {
    /// Unique worker identifier
    id: usize,

    /// Request target (shared, read-only)
    target: Arc<Target>,

    /// Prober owned by this worker (forked by the coordinator)
    prober: Arc<dyn Prober>,

    /// Count failures as errors
    count_errors: bool,

    /// Put the worker id in the tally
    tag: bool,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        id: usize,
        target: Arc<Target>,
        prober: Arc<dyn Prober>,
        count_errors: bool,
        tag: bool,
    ) -> Self {
        Self {
            id,
            target,
            prober,
            count_errors,
            tag,
        }
    }

    /// Run the worker loop until stopped
    ///
    /// The stop receiver is polled without blocking before every probe, so a
    /// stop is observed at most one probe late. A dropped sender counts as a
    /// stop. There is no request budget: only the stop ends the loop.
    pub async fn run(self, mut stop: oneshot::Receiver<()>) -> Tally {
        let mut tally = Tally::new(self.tag.then_some(self.id));
        tally.start();

        tracing::debug!(worker_id = self.id, "Worker started");

        loop {
            match stop.try_recv() {
                Ok(()) => {
                    tracing::debug!(worker_id = self.id, "Worker received stop");
                    break;
                }
                Err(TryRecvError::Closed) => {
                    tracing::debug!(worker_id = self.id, "Stop handle dropped, worker stopping");
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            match self.prober.probe(&self.target).await {
                Outcome::Success(status) => tally.record_success(&status),
                Outcome::Failure(e) => {
                    tracing::warn!(worker_id = self.id, error = %e, "Request failed");
                    if self.count_errors {
                        tally.record_error(e.kind());
                    } else {
                        tally.record_uncounted_failure();
                    }
                }
            }

            // A probe that never awaits I/O would otherwise keep the timer
            // driver from firing the deadline.
            tokio::task::yield_now().await;
        }

        tally.stop();
        tracing::debug!(
            worker_id = self.id,
            iterations = tally.iterations,
            errors = tally.errors,
            elapsed_ms = ?tally.elapsed().map(|d| d.as_millis()),
            "Worker finished"
        );

        tally
    }

    /// Run until stopped, then hand the finished tally to the aggregator
    pub async fn run_and_report(self, stop: oneshot::Receiver<()>, tallies: mpsc::Sender<Tally>) {
        let id = self.id;
        let tally = self.run(stop).await;

        if tallies.send(tally).await.is_err() {
            tracing::debug!(worker_id = id, "Tally channel closed, result dropped");
        }
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("target", &self.target.url().as_str())
            .field("prober", &self.prober.name())
            .field("count_errors", &self.count_errors)
            .field("tag", &self.tag)
            .finish()
    }
}
