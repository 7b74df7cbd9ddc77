//! HTTP prober backed by reqwest

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::target::Target;
use crate::traits::{Outcome, ProbeError, Prober};

/// Issues one GET per probe and reports the response status
///
/// Idle connections are never pooled, so each probe opens its own
/// connection and releases it when the response is dropped. Workers never
/// share a client: each one gets its own through [`Prober::fork`].
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpProber {
    /// Create a prober with an optional per-request timeout
    pub fn new(timeout: Option<Duration>) -> Result<Self, ProbeError> {
        let mut builder = Client::builder().pool_max_idle_per_host(0);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, timeout })
    }

    /// Configured per-request timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl Prober for HttpProber {
    fn name(&self) -> &str {
        "http"
    }

    fn fork(&self) -> Result<Arc<dyn Prober>, ProbeError> {
        Ok(Arc::new(HttpProber::new(self.timeout())?))
    }

    async fn probe(&self, target: &Target) -> Outcome {
        // Built once, never retried.
        let request = match self
            .client
            .get(target.url().clone())
            .headers(target.headers().clone())
            .build()
        {
            Ok(request) => request,
            Err(e) => return Outcome::Failure(e.into()),
        };

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status().to_string();
                drop(response);
                Outcome::Success(status)
            }
            Err(e) => Outcome::Failure(e.into()),
        }
    }
}
