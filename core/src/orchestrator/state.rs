//! Coordinator phases and stop triggers

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a run
///
/// `Idle -> Validating -> Running -> Stopping -> Aggregating -> Done`, or
/// `Validating -> Aborted` when the pre-flight probe fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Nothing started yet
    Idle,
    /// Pre-flight probe in progress
    Validating,
    /// Workers are probing
    Running,
    /// Stop notifications are being sent
    Stopping,
    /// All stops sent; waiting for the remaining tallies
    Aggregating,
    /// Summary produced
    Done,
    /// Run ended without a summary
    Aborted,
}

impl RunPhase {
    /// Whether worker tasks are alive in this phase
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunPhase::Running | RunPhase::Stopping | RunPhase::Aggregating
        )
    }

    /// Whether the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Aborted)
    }
}

/// What ended the running phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopTrigger {
    /// The run duration elapsed
    Deadline,
    /// External cancellation (e.g., Ctrl+C)
    Cancelled,
}

impl std::fmt::Display for StopTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopTrigger::Deadline => f.write_str("deadline"),
            StopTrigger::Cancelled => f.write_str("cancelled"),
        }
    }
}
