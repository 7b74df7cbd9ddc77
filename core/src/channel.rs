//! Channel configuration for worker -> aggregator handoff

/// Channel buffer configuration for tally handoff
#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    /// Tally channel buffer size. `None` sizes it to the worker count so a
    /// finished worker never waits on the aggregator.
    pub tally_buffer: Option<usize>,
}

impl ChannelConfig {
    /// Create a new channel config with a fixed tally buffer size
    pub fn with_tally_buffer(mut self, size: usize) -> Self {
        self.tally_buffer = Some(size);
        self
    }

    /// Buffer capacity to use for a run with `worker_count` workers
    ///
    /// Never returns zero; tokio's mpsc rejects empty buffers.
    pub fn capacity_for(&self, worker_count: usize) -> usize {
        self.tally_buffer.unwrap_or(worker_count).max(1)
    }
}
