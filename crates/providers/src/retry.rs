//! Bounded retries with a per-attempt timeout.
//!
//! Only transient failures (network, timeout, rate limit, 5xx) are retried.
//! Everything else is returned on the first occurrence, as is a rate limit
//! whose `Retry-After` exceeds the backoff ceiling.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tablechat_core::error::GenerationError;
use tablechat_core::generation::*;
use tracing::{info, warn};

/// Upper bound for any single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A generator that retries its inner generator on transient failures.
pub struct RetryingGenerator {
    inner: Arc<dyn Generator>,
    max_attempts: u32,
    initial_backoff: Duration,
    timeout: Duration,
}

impl RetryingGenerator {
    pub fn new(inner: Arc<dyn Generator>) -> Self {
        Self {
            inner,
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(120),
        }
    }

    /// Total attempts including the first. Zero is treated as one.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// How long to wait before the next attempt, or `None` when the server
    /// asked for a longer pause than this wrapper is willing to sleep.
    fn delay_for(&self, attempt: u32, error: &GenerationError) -> Option<Duration> {
        let exponential = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(MAX_BACKOFF);
        match error {
            GenerationError::RateLimited { retry_after_secs } => {
                let requested = Duration::from_secs(*retry_after_secs);
                (requested <= MAX_BACKOFF).then(|| exponential.max(requested))
            }
            _ => Some(exponential),
        }
    }
}

#[async_trait]
impl Generator for RetryingGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, GenerationError> {
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.timeout, self.inner.generate(request.clone()))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(format!(
                    "'{}' did not answer within {}s",
                    self.inner.name(),
                    self.timeout.as_secs()
                ))),
            };

            let error = match result {
                Ok(response) => {
                    if attempt > 1 {
                        info!(
                            generator = %self.inner.name(),
                            attempt,
                            "Generation succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !error.is_transient() || attempt >= self.max_attempts {
                return Err(error);
            }

            let Some(delay) = self.delay_for(attempt, &error) else {
                warn!(
                    generator = %self.inner.name(),
                    attempt,
                    error = %error,
                    "Server asked to wait longer than the retry ceiling, giving up"
                );
                return Err(error);
            };
            warn!(
                generator = %self.inner.name(),
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient generation failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        match tokio::time::timeout(self.timeout, self.inner.health_check()).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout("health check timed out".into())),
        }
    }
}
