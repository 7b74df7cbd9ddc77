//! Mock prober shared by the worker and orchestrator tests

use crate::target::Target;
use crate::traits::{FailureKind, Outcome, ProbeError, Prober};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Behavior {
    /// Always answer with this status label
    Status(&'static str),
    /// Always fail with this kind
    Fail(FailureKind),
    /// Answer "200 OK", but fail every n-th call with a transport error
    FailEvery(usize),
}

/// Forks share the call and fork counters with their parent.
pub(crate) struct MockProber {
    behavior: Behavior,
    delay: Option<Duration>,
    fork_fails: bool,
    calls: Arc<AtomicUsize>,
    forks: Arc<AtomicUsize>,
}

impl MockProber {
    pub(crate) fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            fork_fails: false,
            calls: Arc::new(AtomicUsize::new(0)),
            forks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn ok() -> Self {
        Self::new(Behavior::Status("200 OK"))
    }

    pub(crate) fn failing(kind: FailureKind) -> Self {
        Self::new(Behavior::Fail(kind))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_fork_failure(mut self) -> Self {
        self.fork_fails = true;
        self
    }

    /// Probes issued by this prober and all of its forks
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Successful forks taken from this prober or its forks
    pub(crate) fn forks(&self) -> usize {
        self.forks.load(Ordering::SeqCst)
    }
}

fn error_for(kind: FailureKind) -> ProbeError {
    let message = "simulated failure".to_string();
    match kind {
        FailureKind::Construction => ProbeError::Construction(message),
        FailureKind::Connect => ProbeError::Connect(message),
        FailureKind::Timeout => ProbeError::Timeout(message),
        FailureKind::Transport => ProbeError::Transport(message),
    }
}

#[async_trait]
impl Prober for MockProber {
    fn name(&self) -> &str {
        "mock"
    }

    fn fork(&self) -> Result<Arc<dyn Prober>, ProbeError> {
        if self.fork_fails {
            return Err(ProbeError::Construction("simulated client build failure".into()));
        }
        self.forks.fetch_add(1, Ordering::SeqCst);

        Ok(Arc::new(MockProber {
            behavior: self.behavior,
            delay: self.delay,
            fork_fails: self.fork_fails,
            calls: Arc::clone(&self.calls),
            forks: Arc::clone(&self.forks),
        }))
    }

    async fn probe(&self, _target: &Target) -> Outcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.behavior {
            Behavior::Status(status) => Outcome::Success(status.to_string()),
            Behavior::Fail(kind) => Outcome::Failure(error_for(kind)),
            Behavior::FailEvery(n) if call % n == 0 => {
                Outcome::Failure(error_for(FailureKind::Transport))
            }
            Behavior::FailEvery(_) => Outcome::Success("200 OK".to_string()),
        }
    }
}

pub(crate) fn target() -> Target {
    Target::parse("http://localhost:8080/").expect("valid test target")
}
