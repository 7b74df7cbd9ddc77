//! Tests for the Coordinator and Aggregator

use super::aggregator::{aggregate_tallies, Aggregator, RunSummary};
use super::builder::CoordinatorBuilder;
use super::executor::Coordinator;
use super::state::{RunPhase, StopTrigger};
use crate::channel::ChannelConfig;
use crate::config::RunConfig;
use crate::error::HammerError;
use crate::mock::{self, Behavior, MockProber};
use crate::target::Target;
use crate::traits::{FailureKind, Outcome, ProbeError, Prober};
use crate::worker::Tally;

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

// ============================================================================
// Helpers
// ============================================================================

fn coordinator(workers: usize, duration: Duration, prober: Arc<dyn Prober>) -> Coordinator {
    CoordinatorBuilder::new()
        .worker_count(workers)
        .duration(duration)
        .target(mock::target())
        .prober(prober)
        .build()
        .expect("Failed to build coordinator")
}

fn tally(worker_id: usize, ok: u64, errors: u64) -> Tally {
    let mut t = Tally::new(Some(worker_id));
    for _ in 0..ok {
        t.record_success("200 OK");
    }
    for _ in 0..errors {
        t.record_error(FailureKind::Connect);
    }
    t
}

/// Properties every completed run must satisfy
fn assert_well_formed(summary: &RunSummary, workers: usize) {
    assert_eq!(summary.total_workers, workers);
    assert_eq!(summary.workers.len(), workers);

    let iterations: u64 = summary.workers.iter().map(|t| t.iterations).sum();
    assert_eq!(summary.total_iterations, iterations);

    for (status, total) in &summary.status_totals {
        let per_worker: u64 = summary
            .workers
            .iter()
            .map(|t| t.status_counts.get(status).copied().unwrap_or(0))
            .sum();
        assert_eq!(*total, per_worker, "status {status}");
    }

    assert_eq!(
        summary.total_iterations,
        summary.total_errors + summary.total_responses()
    );
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_run_summary_default() {
    let summary = RunSummary::default();
    assert_eq!(summary.total_workers, 0);
    assert_eq!(summary.total_iterations, 0);
    assert_eq!(summary.error_rate(), 0.0);
    assert_eq!(summary.requests_per_second(), 0.0);
}

#[test]
fn test_aggregate_tallies_sums_fields() {
    let mut a = tally(0, 10, 2);
    a.record_success("503 Service Unavailable");
    let b = tally(1, 5, 0);
    let c = tally(2, 0, 4);

    let summary = aggregate_tallies(vec![a, b, c]);

    assert_eq!(summary.total_iterations, 22);
    assert_eq!(summary.total_errors, 6);
    assert_eq!(summary.status_totals["200 OK"], 15);
    assert_eq!(summary.status_totals["503 Service Unavailable"], 1);
    assert_eq!(summary.error_kinds[&FailureKind::Connect], 6);
    assert_well_formed(&summary, 3);
}

#[test]
fn test_run_summary_rates() {
    let summary = RunSummary {
        total_iterations: 200,
        total_errors: 50,
        elapsed: Duration::from_secs(2),
        ..Default::default()
    };
    assert!((summary.error_rate() - 0.25).abs() < 0.001);
    assert!((summary.requests_per_second() - 100.0).abs() < 0.001);
}

#[tokio::test]
async fn test_aggregator_waits_for_all_tallies() {
    let (tx, rx) = mpsc::channel(4);
    tx.send(tally(0, 1, 0)).await.unwrap();
    tx.send(tally(1, 1, 0)).await.unwrap();

    let pending = tokio::time::timeout(
        Duration::from_millis(50),
        Aggregator::new(3, rx).collect(),
    )
    .await;
    assert!(pending.is_err(), "collect returned with 2 of 3 tallies");
    drop(tx);
}

#[tokio::test]
async fn test_aggregator_collects_in_any_order() {
    let (tx, rx) = mpsc::channel(1);
    let aggregator = Aggregator::new(3, rx);
    assert_eq!(aggregator.expected(), 3);

    tokio::spawn(async move {
        for id in [2, 0, 1] {
            tokio::time::sleep(Duration::from_millis(5)).await;
            tx.send(tally(id, id as u64 + 1, 0)).await.unwrap();
        }
    });

    let summary = aggregator.collect().await.unwrap();
    assert_eq!(summary.total_iterations, 6);
    let order: Vec<_> = summary.workers.iter().map(|t| t.worker_id).collect();
    assert_eq!(order, vec![Some(2), Some(0), Some(1)]);
}

#[tokio::test]
async fn test_aggregator_takes_exactly_expected() {
    let (tx, rx) = mpsc::channel(4);
    for id in 0..4 {
        tx.send(tally(id, 1, 0)).await.unwrap();
    }

    let summary = Aggregator::new(3, rx).collect().await.unwrap();
    assert_eq!(summary.total_workers, 3);
    assert_eq!(summary.total_iterations, 3);
}

#[tokio::test]
async fn test_aggregator_shortfall_when_senders_drop() {
    let (tx, rx) = mpsc::channel(4);
    tx.send(tally(0, 1, 0)).await.unwrap();
    drop(tx);

    let err = Aggregator::new(3, rx).collect().await.unwrap_err();
    assert!(matches!(
        err,
        HammerError::AggregationShortfall {
            expected: 3,
            received: 1
        }
    ));
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn test_builder_missing_target() {
    let result = CoordinatorBuilder::new()
        .prober(Arc::new(MockProber::ok()))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_builder_missing_prober() {
    let result = CoordinatorBuilder::new().target(mock::target()).build();
    assert!(result.is_err());
}

#[test]
fn test_builder_zero_workers_rejected() {
    let result = CoordinatorBuilder::new()
        .target(mock::target())
        .prober(Arc::new(MockProber::ok()))
        .worker_count(0)
        .build();
    assert!(matches!(result, Err(HammerError::Config(_))));
}

#[tokio::test]
async fn test_zero_workers_rejected_before_validation_probe() {
    let prober = Arc::new(MockProber::ok());
    let coordinator = Coordinator::new(
        RunConfig::new(0),
        Arc::new(mock::target()),
        prober.clone(),
        ChannelConfig::default(),
    );

    let err = coordinator.run_for_duration().await.unwrap_err();
    assert!(matches!(err, HammerError::Config(_)));
    assert_eq!(prober.calls(), 0);
    assert_eq!(coordinator.phase(), RunPhase::Idle);
}

// ============================================================================
// Runs
// ============================================================================

#[tokio::test]
async fn test_single_worker_always_ok() {
    let coordinator = coordinator(1, Duration::from_millis(200), Arc::new(MockProber::ok()));

    let summary = coordinator.run_for_duration().await.expect("Run failed");

    assert_well_formed(&summary, 1);
    assert!(summary.total_iterations >= 1000, "only {} iterations", summary.total_iterations);
    assert_eq!(summary.total_errors, 0);
    assert_eq!(summary.status_totals.len(), 1);
    assert_eq!(summary.status_totals["200 OK"], summary.total_iterations);
    assert_eq!(summary.trigger, Some(StopTrigger::Deadline));
    assert!(summary.elapsed >= Duration::from_millis(200));
    assert!(summary.started_at.is_some());
}

#[tokio::test]
async fn test_four_workers_transport_errors() {
    // First call (the validation probe) succeeds, every other call fails.
    let prober = Arc::new(FailAfterFirst::default());
    let coordinator = coordinator(4, Duration::from_millis(50), prober);

    let summary = coordinator.run_for_duration().await.expect("Run failed");

    assert_well_formed(&summary, 4);
    assert!(summary.total_iterations > 0);
    assert_eq!(summary.total_errors, summary.total_iterations);
    assert!(summary.status_totals.is_empty());
    assert_eq!(
        summary.error_kinds[&FailureKind::Transport],
        summary.total_iterations
    );
}

#[tokio::test]
async fn test_validation_failure_starts_no_workers() {
    let prober = Arc::new(MockProber::failing(FailureKind::Connect));
    let coordinator = coordinator(8, Duration::from_secs(10), prober.clone());

    let start = Instant::now();
    let err = coordinator.run_for_duration().await.unwrap_err();

    assert!(matches!(err, HammerError::Validation { .. }));
    assert!(err.is_pre_flight());
    assert_eq!(prober.calls(), 1);
    assert_eq!(coordinator.phase(), RunPhase::Aborted);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_each_worker_gets_its_own_prober() {
    let prober = Arc::new(MockProber::ok());
    let coordinator = coordinator(4, Duration::from_millis(20), prober.clone());

    let summary = coordinator.run_for_duration().await.expect("Run failed");

    assert_well_formed(&summary, 4);
    assert_eq!(prober.forks(), 4);
    // The validation probe ran on the coordinator's own instance.
    assert_eq!(prober.calls() as u64, summary.total_iterations + 1);
}

#[tokio::test]
async fn test_fork_failure_starts_no_workers() {
    let prober = Arc::new(MockProber::ok().with_fork_failure());
    let coordinator = coordinator(3, Duration::from_secs(10), prober.clone());

    let err = coordinator.run_for_duration().await.unwrap_err();

    assert!(matches!(err, HammerError::ProberSetup { worker_id: 0, .. }));
    assert!(err.is_pre_flight());
    assert_eq!(prober.calls(), 1);
    assert_eq!(coordinator.phase(), RunPhase::Aborted);
}

#[tokio::test]
async fn test_zero_duration_run() {
    let coordinator = coordinator(3, Duration::ZERO, Arc::new(MockProber::ok()));

    let summary = coordinator.run_for_duration().await.expect("Run failed");

    assert_well_formed(&summary, 3);
    assert_eq!(summary.trigger, Some(StopTrigger::Deadline));
    assert!(summary.elapsed < Duration::from_secs(1));
}

#[tokio::test]
async fn test_cancellation_before_deadline() {
    let coordinator = coordinator(3, Duration::from_secs(30), Arc::new(MockProber::ok()));

    let start = Instant::now();
    let summary = coordinator
        .run(tokio::time::sleep(Duration::from_millis(20)))
        .await
        .expect("Run failed");

    assert_well_formed(&summary, 3);
    assert_eq!(summary.trigger, Some(StopTrigger::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(summary.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_immediate_cancellation() {
    let coordinator = coordinator(3, Duration::from_secs(30), Arc::new(MockProber::ok()));

    let summary = coordinator.run(async {}).await.expect("Run failed");

    assert_well_formed(&summary, 3);
    assert_eq!(summary.trigger, Some(StopTrigger::Cancelled));
    assert!(summary.elapsed < Duration::from_secs(1));
}

#[tokio::test]
async fn test_cancellation_after_deadline_is_ignored() {
    let coordinator = coordinator(2, Duration::from_millis(20), Arc::new(MockProber::ok()));

    let summary = coordinator
        .run(tokio::time::sleep(Duration::from_millis(40)))
        .await
        .expect("Run failed");

    assert_well_formed(&summary, 2);
    assert_eq!(summary.trigger, Some(StopTrigger::Deadline));
}

#[tokio::test]
async fn test_worker_ids_unique() {
    let coordinator = coordinator(5, Duration::from_millis(10), Arc::new(MockProber::ok()));

    let summary = coordinator.run_for_duration().await.expect("Run failed");

    let ids: BTreeSet<_> = summary.workers.iter().filter_map(|t| t.worker_id).collect();
    assert_eq!(ids, (0..5).collect());
}

#[tokio::test]
async fn test_small_tally_buffer_still_collects_all() {
    let coordinator = CoordinatorBuilder::new()
        .worker_count(6)
        .duration(Duration::from_millis(10))
        .target(mock::target())
        .prober(Arc::new(MockProber::ok()))
        .channel_config(ChannelConfig::default().with_tally_buffer(1))
        .build()
        .unwrap();

    let summary = coordinator.run_for_duration().await.expect("Run failed");
    assert_well_formed(&summary, 6);
}

#[tokio::test]
async fn test_mixed_outcomes_balance() {
    let coordinator = coordinator(
        3,
        Duration::from_millis(30),
        Arc::new(MockProber::new(Behavior::FailEvery(4))),
    );

    let summary = coordinator.run_for_duration().await.expect("Run failed");

    assert_well_formed(&summary, 3);
    assert!(summary.total_errors > 0);
    assert!(summary.error_rate() > 0.0 && summary.error_rate() < 1.0);
}

#[tokio::test]
async fn test_interrupt_disabled_runs_to_deadline() {
    let coordinator = CoordinatorBuilder::new()
        .config(
            RunConfig::new(2)
                .with_duration(Duration::from_millis(20))
                .with_handle_interrupt(false),
        )
        .target(mock::target())
        .prober(Arc::new(MockProber::ok()))
        .build()
        .unwrap();

    let summary = coordinator.run_with_signal_handling().await.unwrap();
    assert_eq!(summary.trigger, Some(StopTrigger::Deadline));
}

#[tokio::test]
async fn test_phase_transitions() {
    let coordinator = coordinator(2, Duration::from_millis(20), Arc::new(MockProber::ok()));
    let mut phases = coordinator.phase_receiver();
    assert_eq!(*phases.borrow(), RunPhase::Idle);

    coordinator.run_for_duration().await.unwrap();

    assert!(phases.has_changed().unwrap());
    assert_eq!(*phases.borrow_and_update(), RunPhase::Done);
}

#[tokio::test]
async fn test_summary_json() {
    let coordinator = coordinator(1, Duration::from_millis(5), Arc::new(MockProber::ok()));
    let summary = coordinator.run_for_duration().await.unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["total_workers"], 1);
    assert_eq!(json["trigger"], "deadline");
    assert!(json["elapsed"].is_string());
    assert!(json.get("error_kinds").is_none());
}

#[tokio::test]
async fn test_coordinator_debug_format() {
    let coordinator = coordinator(1, Duration::from_secs(1), Arc::new(MockProber::ok()));

    let debug = format!("{:?}", coordinator);
    assert!(debug.contains("Coordinator"));
    assert!(debug.contains("mock"));
    assert!(debug.contains("Idle"));
}

// ============================================================================
// Local probers
// ============================================================================

/// Succeeds once (the validation probe), then always fails; forks only fail
#[derive(Default)]
struct FailAfterFirst {
    validated: AtomicBool,
}

#[async_trait]
impl Prober for FailAfterFirst {
    fn name(&self) -> &str {
        "fail-after-first"
    }

    fn fork(&self) -> Result<Arc<dyn Prober>, ProbeError> {
        Ok(Arc::new(FailAfterFirst {
            validated: AtomicBool::new(true),
        }))
    }

    async fn probe(&self, _target: &Target) -> Outcome {
        if self.validated.swap(true, Ordering::SeqCst) {
            Outcome::Failure(ProbeError::Transport("connection reset".into()))
        } else {
            Outcome::Success("200 OK".into())
        }
    }
}
