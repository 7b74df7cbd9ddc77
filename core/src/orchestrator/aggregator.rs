//! Tally collection and reduction

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{HammerError, HammerResult};
use crate::traits::FailureKind;
use crate::worker::Tally;

use super::state::StopTrigger;

/// Reduction of every worker's tally into one run-level result
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Number of tallies folded in
    pub total_workers: usize,

    /// Total probes issued
    pub total_iterations: u64,

    /// Total failed probes
    pub total_errors: u64,

    /// Response count per status label
    pub status_totals: BTreeMap<String, u64>,

    /// Failure count per kind
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub error_kinds: BTreeMap<FailureKind, u64>,

    /// Wall-clock time from worker launch to the last tally
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,

    /// Which trigger stopped the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<StopTrigger>,

    /// When the workers were launched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Per-worker tallies, in arrival order
    pub workers: Vec<Tally>,
}

impl RunSummary {
    /// Total probes that got a response
    pub fn total_responses(&self) -> u64 {
        self.status_totals.values().sum()
    }

    /// Get the error rate (0.0 - 1.0)
    pub fn error_rate(&self) -> f64 {
        if self.total_iterations > 0 {
            self.total_errors as f64 / self.total_iterations as f64
        } else {
            0.0
        }
    }

    /// Overall probes per second
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_iterations as f64 / secs
        } else {
            0.0
        }
    }
}

/// Fold tallies into a summary with plain addition
///
/// Elapsed time and trigger are left for the coordinator to fill in.
pub fn aggregate_tallies(tallies: Vec<Tally>) -> RunSummary {
    let mut combined = Tally::default();
    for tally in &tallies {
        combined.merge(tally);
    }

    RunSummary {
        total_workers: tallies.len(),
        total_iterations: combined.iterations,
        total_errors: combined.errors,
        status_totals: combined.status_counts,
        error_kinds: combined.error_kinds,
        workers: tallies,
        ..Default::default()
    }
}

/// Collects exactly one tally per worker
///
/// Trusts cardinality, not identity: it stops after `expected` tallies and
/// never looks at who sent them.
#[derive(Debug)]
pub struct Aggregator {
    expected: usize,
    tallies: mpsc::Receiver<Tally>,
}

impl Aggregator {
    /// Create an aggregator expecting `expected` tallies on `tallies`
    pub fn new(expected: usize, tallies: mpsc::Receiver<Tally>) -> Self {
        Self { expected, tallies }
    }

    /// Number of tallies this aggregator waits for
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Wait for all tallies and reduce them
    ///
    /// Blocks without a timeout. Fails only if every sender is dropped before
    /// `expected` tallies have arrived.
    pub async fn collect(mut self) -> HammerResult<RunSummary> {
        let mut received = Vec::with_capacity(self.expected);

        while received.len() < self.expected {
            match self.tallies.recv().await {
                Some(tally) => {
                    tracing::debug!(
                        worker_id = ?tally.worker_id,
                        iterations = tally.iterations,
                        errors = tally.errors,
                        remaining = self.expected - received.len() - 1,
                        "Collected tally"
                    );
                    received.push(tally);
                }
                None => {
                    return Err(HammerError::AggregationShortfall {
                        expected: self.expected,
                        received: received.len(),
                    });
                }
            }
        }

        Ok(aggregate_tallies(received))
    }
}
