//! hammer-core: worker pool and aggregation for open-loop HTTP load generation
//!
//! This crate provides the moving parts behind the `hammer` CLI:
//!
//! - Prober trait and the reqwest-backed HTTP prober
//! - Workers that probe a target until told to stop
//! - The Coordinator, which validates the target, fans workers out, and
//!   stops them on deadline or cancellation
//! - The Aggregator, which folds one tally per worker into a run summary
//! - Configuration and error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod target;
pub mod traits;
pub mod worker;

#[cfg(test)]
mod mock;

pub use channel::ChannelConfig;
pub use config::{ConfigError, RunConfig};
pub use error::{HammerError, HammerResult};
pub use http::HttpProber;
pub use orchestrator::{
    aggregate_tallies, Aggregator, Coordinator, CoordinatorBuilder, RunPhase, RunSummary,
    StopTrigger,
};
pub use target::{Target, DEFAULT_USER_AGENT};
pub use traits::{FailureKind, Outcome, ProbeError, Prober};
pub use worker::{Tally, Worker, WorkerBuilder};
