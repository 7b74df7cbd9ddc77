//! Coordinator for run lifecycle management
//!
//! The Coordinator drives a complete load run:
//! - One pre-flight validation probe; failure aborts before any worker starts
//! - Spawning one worker task per configured worker
//! - Racing the run deadline against external cancellation
//! - Sending each worker exactly one stop notification
//! - Collecting exactly one tally per worker through the Aggregator
//!
//! # Example
//!
//! ```ignore
//! use hammer_core::{CoordinatorBuilder, HttpProber, Target};
//!
//! let coordinator = CoordinatorBuilder::new()
//!     .worker_count(4)
//!     .duration(Duration::from_secs(10))
//!     .target(Target::parse("http://localhost:8080/")?)
//!     .prober(Arc::new(HttpProber::new(None)?))
//!     .build()?;
//!
//! let summary = coordinator.run_with_signal_handling().await?;
//! ```

mod aggregator;
mod builder;
mod executor;
mod state;

pub use aggregator::{aggregate_tallies, Aggregator, RunSummary};
pub use builder::CoordinatorBuilder;
pub use executor::Coordinator;
pub use state::{RunPhase, StopTrigger};

#[cfg(test)]
mod tests;
