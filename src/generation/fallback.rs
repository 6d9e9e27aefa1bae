//! Ordered fallback across generator backends.

use super::TextGenerator;
use crate::constants::DEFAULT_PROVIDER_TIMEOUT;
use crate::error::ServerError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Tries each backend in order and returns the first success.
///
/// Every attempt has its own deadline; an attempt that runs past it counts
/// as a failure and the next backend is tried.
pub struct FallbackGenerator {
    backends: Vec<Arc<dyn TextGenerator>>,
    name: String,
    attempt_timeout: Duration,
}

impl FallbackGenerator {
    /// Create a chain from backends in preference order.
    pub fn new(backends: Vec<Arc<dyn TextGenerator>>) -> Self {
        let name = backends
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            backends,
            name,
            attempt_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Override the per-attempt deadline.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

#[async_trait]
impl TextGenerator for FallbackGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ServerError> {
        let mut failures = Vec::with_capacity(self.backends.len());

        for backend in &self.backends {
            let attempt = tokio::time::timeout(self.attempt_timeout, backend.generate(prompt));
            let outcome = attempt.await.unwrap_or_else(|_| {
                Err(ServerError::generation(format!(
                    "no response within {}s",
                    self.attempt_timeout.as_secs()
                )))
            });

            match outcome {
                Ok(sql) => return Ok(sql),
                Err(e) => {
                    warn!(provider = backend.name(), error = %e, "Provider failed, trying next");
                    let reason = match e {
                        ServerError::Generation(message) => message,
                        other => other.to_string(),
                    };
                    failures.push(format!("{}: {}", backend.name(), reason));
                }
            }
        }

        if failures.is_empty() {
            return Err(ServerError::generation("no providers configured"));
        }
        Err(ServerError::generation(failures.join("; ")))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
