//! Worker module for probing a target until told to stop
//!
//! The Worker is the unit of load in hammer. Its loop is deliberately
//! small: **poll stop -> probe -> tally -> repeat**.
//!
//! 1. Check, without blocking, whether a stop notification has arrived
//! 2. If so, freeze the Tally and hand it to the aggregator
//! 3. Otherwise issue one probe through the Prober
//! 4. Count the iteration, plus either its status label or an error
//!
//! Workers share no mutable state. Each owns its Tally and talks to the
//! rest of the system only through its one-shot stop receiver and the
//! tally channel.
//!
//! # Example
//!
//! ```ignore
//! use hammer_core::worker::WorkerBuilder;
//!
//! let worker = WorkerBuilder::new(0)
//!     .target(target)
//!     .prober(prober)
//!     .build()?;
//!
//! let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
//! let handle = tokio::spawn(worker.run(stop_rx));
//! stop_tx.send(()).ok();
//! let tally = handle.await?;
//! println!("{} iterations", tally.iterations);
//! ```

mod builder;
mod executor;
mod stats;

pub use builder::WorkerBuilder;
pub use executor::Worker;
pub use stats::Tally;
