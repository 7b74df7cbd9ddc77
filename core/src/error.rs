//! Error types for hammer-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::traits::ProbeError;

/// Run-level error
///
/// Only configuration and validation failures abort a run. Per-request
/// failures never surface here; they are tallied by the worker that saw them.
#[derive(Error, Debug)]
pub enum HammerError {
    /// Configuration error, raised before any request is sent
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The pre-flight probe failed; no workers were started
    #[error("validation probe against {target} failed: {source}")]
    Validation {
        /// Target URL that was probed
        target: String,
        /// Why the probe failed
        #[source]
        source: ProbeError,
    },

    /// A worker's prober could not be built; no workers were started
    #[error("failed to build prober for worker {worker_id}: {source}")]
    ProberSetup {
        /// Worker the prober was for
        worker_id: usize,
        /// Why construction failed
        #[source]
        source: ProbeError,
    },

    /// Every tally sender went away before all workers reported
    #[error("expected {expected} worker tallies but only {received} arrived")]
    AggregationShortfall {
        /// Number of workers launched
        expected: usize,
        /// Number of tallies actually received
        received: usize,
    },
}

impl HammerError {
    /// Create a missing configuration error
    pub fn missing_config(field: &'static str) -> Self {
        HammerError::Config(ConfigError::Missing(field))
    }

    /// Check if this error aborted the run before any worker started
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            HammerError::Config(_)
                | HammerError::Validation { .. }
                | HammerError::ProberSetup { .. }
        )
    }
}

/// Result type alias
pub type HammerResult<T> = std::result::Result<T, HammerError>;
