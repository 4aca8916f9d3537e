//! Generation service clients for TableChat.
//!
//! Everything here implements `tablechat_core::Generator`. `build_from_config`
//! wires the Gemini client behind the retry layer.

pub mod gemini;
pub mod retry;

pub use gemini::GeminiClient;
pub use retry::RetryingGenerator;

use std::sync::Arc;
use std::time::Duration;

use tablechat_config::{AppConfig, ConfigError};
use tablechat_core::Generator;

/// Build the generator described by `config`.
///
/// Fails when no API key is configured, so startup can stop before any
/// request is attempted.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Generator>, ConfigError> {
    let api_key = config.require_api_key()?;

    let client = GeminiClient::new(api_key)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?
        .with_base_url(&config.api_url);

    let retrying = RetryingGenerator::new(Arc::new(client))
        .with_max_attempts(config.retry.max_attempts)
        .with_initial_backoff(Duration::from_millis(config.retry.initial_backoff_ms))
        .with_timeout(Duration::from_secs(config.retry.request_timeout_secs));

    Ok(Arc::new(retrying))
}
