//! Per-worker tally

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::traits::FailureKind;

/// Counters owned by a single worker
///
/// Mutated only by its worker; frozen once handed to the aggregator.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Tally {
    /// Worker identifier, present when worker tagging is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<usize>,

    /// Number of probes issued
    pub iterations: u64,

    /// Number of failed probes
    pub errors: u64,

    /// Response count per status label
    pub status_counts: BTreeMap<String, u64>,

    /// Failure count per kind
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub error_kinds: BTreeMap<FailureKind, u64>,

    /// Worker start time
    #[serde(skip)]
    pub started_at: Option<Instant>,

    /// Worker end time
    #[serde(skip)]
    pub ended_at: Option<Instant>,
}

impl Tally {
    /// Create an empty tally
    pub fn new(worker_id: Option<usize>) -> Self {
        Self {
            worker_id,
            ..Default::default()
        }
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Record a probe that got a response
    pub fn record_success(&mut self, status: &str) {
        self.iterations += 1;
        match self.status_counts.get_mut(status) {
            Some(count) => *count += 1,
            None => {
                self.status_counts.insert(status.to_owned(), 1);
            }
        }
    }

    /// Record a failed probe
    pub fn record_error(&mut self, kind: FailureKind) {
        self.iterations += 1;
        self.errors += 1;
        *self.error_kinds.entry(kind).or_insert(0) += 1;
    }

    /// Record a failed probe without counting it as an error
    pub fn record_uncounted_failure(&mut self) {
        self.iterations += 1;
    }

    /// Number of probes that got a response
    pub fn responses(&self) -> u64 {
        self.status_counts.values().sum()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Get probes per second
    pub fn iterations_per_second(&self) -> f64 {
        self.elapsed()
            .map(|d| {
                let secs = d.as_secs_f64();
                if secs > 0.0 {
                    self.iterations as f64 / secs
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0)
    }

    /// Add another tally's counters into this one
    pub fn merge(&mut self, other: &Tally) {
        self.iterations += other.iterations;
        self.errors += other.errors;
        for (status, count) in &other.status_counts {
            *self.status_counts.entry(status.clone()).or_insert(0) += count;
        }
        for (kind, count) in &other.error_kinds {
            *self.error_kinds.entry(*kind).or_insert(0) += count;
        }
    }
}
