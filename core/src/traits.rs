//! Prober trait and probe outcome types
//!
//! The trait lives in core so workers and the coordinator can be driven by
//! any probe implementation. The HTTP implementation is in [`crate::http`].

use crate::target::Target;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Prober Trait
// ============================================================================

/// Performs one request/response cycle against a target
///
/// Implementations must never panic or return early on a failed request:
/// every failure is classified into an [`Outcome::Failure`]. Any per-call
/// resources (connections, response bodies) are released before `probe`
/// returns.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Prober identifier (e.g., "http")
    fn name(&self) -> &str;

    /// Issue one request and classify the result
    async fn probe(&self, target: &Target) -> Outcome;

    /// Build an independent prober with the same settings
    ///
    /// Called once per worker, so no transport state (connection pools,
    /// locks) is shared between workers.
    fn fork(&self) -> Result<Arc<dyn Prober>, ProbeError>;
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of a single probe
///
/// Any HTTP response, 4xx and 5xx included, is a success: the status label
/// is descriptive, not a verdict.
#[derive(Debug)]
pub enum Outcome {
    /// A response arrived; carries its status label (e.g., "200 OK")
    Success(String),
    /// No response could be obtained
    Failure(ProbeError),
}

impl Outcome {
    /// Check if a response arrived
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Status label, if a response arrived
    pub fn status(&self) -> Option<&str> {
        match self {
            Outcome::Success(status) => Some(status),
            Outcome::Failure(_) => None,
        }
    }
}

// ============================================================================
// Probe Errors
// ============================================================================

/// Why a probe produced no response
///
/// Construction errors (a request that could not even be built) are kept
/// apart from transport errors so callers can tell a configuration bug from
/// expected network noise. Both still count as a single failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The request could not be constructed
    #[error("invalid request: {0}")]
    Construction(String),

    /// Connection could not be established (refused, DNS, TLS handshake)
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other transport-level failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProbeError {
    /// Classify this error for tallying
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Construction(_) => FailureKind::Construction,
            ProbeError::Connect(_) => FailureKind::Connect,
            ProbeError::Timeout(_) => FailureKind::Timeout,
            ProbeError::Transport(_) => FailureKind::Transport,
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_builder() {
            ProbeError::Construction(message)
        } else if err.is_timeout() {
            ProbeError::Timeout(message)
        } else if err.is_connect() {
            ProbeError::Connect(message)
        } else {
            ProbeError::Transport(message)
        }
    }
}

/// Failure classification recorded in tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Request construction failed
    Construction,
    /// Connection failed
    Connect,
    /// Request timed out
    Timeout,
    /// Other transport failure
    Transport,
}

impl FailureKind {
    /// Short label for reports
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Construction => "construction",
            FailureKind::Connect => "connect",
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
