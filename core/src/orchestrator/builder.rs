//! Builder pattern for Coordinator construction

use std::sync::Arc;
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::config::RunConfig;
use crate::error::{HammerError, HammerResult};
use crate::target::Target;
use crate::traits::Prober;

use super::executor::Coordinator;

/// Builder for creating a Coordinator with proper configuration
///
/// # Example
///
/// ```ignore
/// let coordinator = CoordinatorBuilder::new()
///     .worker_count(10)
///     .duration(Duration::from_secs(30))
///     .target(Target::parse("http://localhost:8080/")?)
///     .prober(Arc::new(HttpProber::new(None)?))
///     .build()?;
/// ```
pub struct CoordinatorBuilder {
    config: RunConfig,
    target: Option<Target>,
    prober: Option<Arc<dyn Prober>>,
    channel_config: ChannelConfig,
}

impl CoordinatorBuilder {
    /// Create a new coordinator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            target: None,
            prober: None,
            channel_config: ChannelConfig::default(),
        }
    }

    /// Set the full run configuration
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the worker count
    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.config.worker_count = worker_count;
        self
    }

    /// Set the run duration
    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    /// Set the request target
    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the prober
    pub fn prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Build the coordinator
    ///
    /// # Errors
    ///
    /// Returns an error if target or prober are not set, or if configuration
    /// validation fails.
    pub fn build(self) -> HammerResult<Coordinator> {
        let target = self
            .target
            .ok_or_else(|| HammerError::missing_config("target"))?;

        let prober = self
            .prober
            .ok_or_else(|| HammerError::missing_config("prober"))?;

        self.config.validate()?;

        Ok(Coordinator::new(
            self.config,
            Arc::new(target),
            prober,
            self.channel_config,
        ))
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
