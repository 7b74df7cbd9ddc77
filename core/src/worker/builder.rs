//! Builder pattern for Worker construction

use crate::error::{HammerError, HammerResult};
use crate::target::Target;
use crate::traits::Prober;

use super::executor::Worker;

use std::sync::Arc;

/// Builder for creating Worker instances
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .target(target)
///     .prober(prober)
///     .count_errors(true)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    target: Option<Arc<Target>>,
    prober: Option<Arc<dyn Prober>>,
    count_errors: bool,
    tag: bool,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            target: None,
            prober: None,
            count_errors: true,
            tag: true,
        }
    }

    /// Set the request target
    pub fn target(mut self, target: Arc<Target>) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the prober
    pub fn prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Count failed probes as errors (default: true)
    pub fn count_errors(mut self, enabled: bool) -> Self {
        self.count_errors = enabled;
        self
    }

    /// Record the worker id in the tally (default: true)
    pub fn tag(mut self, enabled: bool) -> Self {
        self.tag = enabled;
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if the target or prober is missing.
    pub fn build(self) -> HammerResult<Worker> {
        let target = self
            .target
            .ok_or_else(|| HammerError::missing_config("target"))?;
        let prober = self
            .prober
            .ok_or_else(|| HammerError::missing_config("prober"))?;

        Ok(Worker::new(
            self.id,
            target,
            prober,
            self.count_errors,
            self.tag,
        ))
    }
}
