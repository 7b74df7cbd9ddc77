//! Run configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Run configuration
///
/// Built once at startup and handed to the coordinator by value. Nothing in
/// it changes after the run begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of concurrent workers
    pub worker_count: usize,

    /// How long workers keep probing before the deadline stop fires
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Optional per-request timeout
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout: Option<Duration>,

    /// Count failed probes as errors in each tally
    #[serde(default = "enabled")]
    pub count_errors: bool,

    /// Stop early on operator interrupt (Ctrl+C)
    #[serde(default = "enabled")]
    pub handle_interrupt: bool,

    /// Record the worker id in each tally
    #[serde(default = "enabled")]
    pub tag_workers: bool,
}

fn enabled() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            duration: Duration::from_secs(1),
            request_timeout: None,
            count_errors: true,
            handle_interrupt: true,
            tag_workers: true,
        }
    }
}

impl RunConfig {
    /// Create a new config with the given worker count
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    /// Set the run duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable error counting
    pub fn with_count_errors(mut self, enabled: bool) -> Self {
        self.count_errors = enabled;
        self
    }

    /// Enable or disable interrupt handling
    pub fn with_handle_interrupt(mut self, enabled: bool) -> Self {
        self.handle_interrupt = enabled;
        self
    }

    /// Enable or disable per-worker ids in tallies
    pub fn with_tag_workers(mut self, enabled: bool) -> Self {
        self.tag_workers = enabled;
        self
    }

    /// Validate the configuration
    ///
    /// A zero duration is legal: workers stop after at most a few probes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount(
                "worker count must be at least 1".into(),
            ));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTimeout(
                "request timeout must be positive".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("invalid worker count: {0}")]
    InvalidWorkerCount(String),

    /// Missing, malformed or unsupported target URL
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Header name or value that cannot be sent
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid request timeout
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    /// A required builder field was never set
    #[error("missing required field: {0}")]
    Missing(&'static str),
}
