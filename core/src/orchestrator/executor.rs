//! Coordinator execution logic

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};

use crate::channel::ChannelConfig;
use crate::config::RunConfig;
use crate::error::{HammerError, HammerResult};
use crate::target::Target;
use crate::traits::{Outcome, Prober};
use crate::worker::{Worker, WorkerBuilder};

use super::aggregator::{Aggregator, RunSummary};
use super::state::{RunPhase, StopTrigger};

/// Coordinator manages the run lifecycle
///
/// Validates the target, launches the workers, races the deadline against
/// external cancellation, sends every worker exactly one stop and hands
/// collection to the [`Aggregator`].
pub struct Coordinator {
    /// Run configuration
    pub(crate) config: RunConfig,

    /// Request target (shared with every worker)
    pub(crate) target: Arc<Target>,

    /// Prober (shared with every worker)
    pub(crate) prober: Arc<dyn Prober>,

    /// Tally channel sizing
    pub(crate) channel_config: ChannelConfig,

    /// Current phase, observable through `phase_receiver`
    pub(crate) phase_tx: watch::Sender<RunPhase>,
}

impl Coordinator {
    /// Create a new coordinator
    ///
    /// Use `CoordinatorBuilder` for a more ergonomic construction.
    pub fn new(
        config: RunConfig,
        target: Arc<Target>,
        prober: Arc<dyn Prober>,
        channel_config: ChannelConfig,
    ) -> Self {
        let (phase_tx, _) = watch::channel(RunPhase::Idle);

        Self {
            config,
            target,
            prober,
            channel_config,
            phase_tx,
        }
    }

    /// Get the run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Get the request target
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Current phase
    pub fn phase(&self) -> RunPhase {
        *self.phase_tx.borrow()
    }

    /// Subscribe to phase transitions
    pub fn phase_receiver(&self) -> watch::Receiver<RunPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: RunPhase) {
        tracing::debug!(?phase, "Run phase changed");
        self.phase_tx.send_replace(phase);
    }

    /// Issue the single pre-flight probe
    ///
    /// On failure the run is aborted: phase becomes `Aborted` and nothing
    /// else is sent.
    pub async fn validate(&self) -> HammerResult<()> {
        self.set_phase(RunPhase::Validating);

        match self.prober.probe(&self.target).await {
            Outcome::Success(status) => {
                tracing::info!(url = %self.target, %status, "Validation probe succeeded");
                Ok(())
            }
            Outcome::Failure(source) => {
                self.set_phase(RunPhase::Aborted);
                tracing::error!(url = %self.target, error = %source, "Validation probe failed");
                Err(HammerError::Validation {
                    target: self.target.to_string(),
                    source,
                })
            }
        }
    }

    /// Run until the deadline or until `cancel` resolves, whichever is first
    ///
    /// The losing trigger is dropped, so each worker gets exactly one stop
    /// no matter how many triggers fire.
    pub async fn run<F>(&self, cancel: F) -> HammerResult<RunSummary>
    where
        F: Future<Output = ()> + Send,
    {
        self.config.validate()?;
        self.validate().await?;

        let worker_count = self.config.worker_count;
        let duration = self.config.duration;
        let (tally_tx, tally_rx) = mpsc::channel(self.channel_config.capacity_for(worker_count));

        tracing::info!(
            workers = worker_count,
            duration_ms = duration.as_millis() as u64,
            url = %self.target,
            "Starting run"
        );

        let workers = match self.prepare_workers() {
            Ok(workers) => workers,
            Err(e) => {
                self.set_phase(RunPhase::Aborted);
                tracing::error!(error = %e, "Could not prepare workers");
                return Err(e);
            }
        };

        let started_at = chrono::Utc::now();
        let start = Instant::now();
        let mut stops = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);

        for worker in workers {
            let (stop_tx, stop_rx) = oneshot::channel();
            stops.push(stop_tx);
            handles.push(tokio::spawn(worker.run_and_report(stop_rx, tally_tx.clone())));
        }
        // Only workers hold senders now; the channel closes if they all exit.
        drop(tally_tx);
        self.set_phase(RunPhase::Running);

        let aggregator = Aggregator::new(worker_count, tally_rx);
        let stopper = async {
            let trigger = wait_for_trigger(duration, cancel).await;
            self.set_phase(RunPhase::Stopping);
            broadcast_stop(stops, trigger);
            self.set_phase(RunPhase::Aggregating);
            trigger
        };

        let (trigger, collected) = tokio::join!(stopper, aggregator.collect());
        let elapsed = start.elapsed();

        for (worker_id, result) in futures::future::join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = result {
                tracing::error!(worker_id, error = %e, "Worker task panicked");
            }
        }

        let mut summary = match collected {
            Ok(summary) => summary,
            Err(e) => {
                self.set_phase(RunPhase::Aborted);
                return Err(e);
            }
        };
        summary.elapsed = elapsed;
        summary.trigger = Some(trigger);
        summary.started_at = Some(started_at);

        self.set_phase(RunPhase::Done);
        tracing::info!(
            elapsed_secs = elapsed.as_secs_f64(),
            total_iterations = summary.total_iterations,
            total_errors = summary.total_errors,
            rps = summary.requests_per_second(),
            %trigger,
            "Run completed"
        );

        Ok(summary)
    }

    /// Build every worker, each with its own forked prober
    ///
    /// All forks happen before any task is spawned, so a failure leaves
    /// nothing running. The coordinator's own prober is kept for validation.
    fn prepare_workers(&self) -> HammerResult<Vec<Worker>> {
        (0..self.config.worker_count)
            .map(|worker_id| {
                let prober = self
                    .prober
                    .fork()
                    .map_err(|source| HammerError::ProberSetup { worker_id, source })?;

                WorkerBuilder::new(worker_id)
                    .target(Arc::clone(&self.target))
                    .prober(prober)
                    .count_errors(self.config.count_errors)
                    .tag(self.config.tag_workers)
                    .build()
            })
            .collect()
    }

    /// Run for the configured duration with no external cancellation
    pub async fn run_for_duration(&self) -> HammerResult<RunSummary> {
        self.run(std::future::pending()).await
    }

    /// Run with Ctrl+C as the external cancellation trigger
    ///
    /// Falls back to `run_for_duration` when interrupt handling is disabled
    /// in the config.
    pub async fn run_with_signal_handling(&self) -> HammerResult<RunSummary> {
        if !self.config.handle_interrupt {
            return self.run_for_duration().await;
        }

        let interrupt = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, shutting down gracefully"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            }
        };

        self.run(interrupt).await
    }
}

/// Wait for the first of deadline or cancellation
async fn wait_for_trigger<F>(duration: Duration, cancel: F) -> StopTrigger
where
    F: Future<Output = ()>,
{
    let trigger = tokio::select! {
        biased;
        _ = tokio::time::sleep(duration) => StopTrigger::Deadline,
        _ = cancel => StopTrigger::Cancelled,
    };
    tracing::info!(%trigger, "Stopping workers");
    trigger
}

/// Send one stop to every worker
///
/// Consumes the senders, so a second broadcast cannot be expressed.
fn broadcast_stop(stops: Vec<oneshot::Sender<()>>, trigger: StopTrigger) {
    let total = stops.len();
    let delivered = stops
        .into_iter()
        .map(|stop| stop.send(()))
        .filter(Result::is_ok)
        .count();

    if delivered < total {
        tracing::warn!(delivered, total, %trigger, "Some workers exited before their stop");
    } else {
        tracing::debug!(delivered, %trigger, "Stop sent to all workers");
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("target", &self.target.url().as_str())
            .field("prober", &self.prober.name())
            .field("phase", &self.phase())
            .finish()
    }
}
