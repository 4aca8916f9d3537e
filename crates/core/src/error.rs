//! Error types for the TableChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error enum; configuration errors live with the config crate.

use std::path::PathBuf;
use thiserror::Error;

// --- Bounded context errors ---

/// Failure to load the knowledge table. Always fatal at startup.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("knowledge file '{}' was not found", path.display())]
    FileNotFound { path: PathBuf },

    #[error("knowledge file '{}' could not be parsed: {reason}", path.display())]
    MalformedData { path: PathBuf, reason: String },

    #[error("knowledge file '{}' has no '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: String },
}

impl LoadError {
    /// The file this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::FileNotFound { path }
            | Self::MalformedData { path, .. }
            | Self::MissingColumn { path, .. } => path,
        }
    }
}

/// Failure of a single call to the remote generation service.
///
/// Recoverable per request: the caller shows the message and the session
/// stays usable.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("upstream request failed: {message} (status: {status_code})")]
    Upstream { status_code: u16, message: String },

    #[error("rate limited by the generation service, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("response blocked by the service: {reason}")]
    Blocked { reason: String },

    #[error("the service returned no text")]
    EmptyResponse,

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("generator not configured: {0}")]
    NotConfigured(String),
}

impl GenerationError {
    /// Whether a retry of the identical request can plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Upstream { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// Short machine-readable tag, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream { .. } => "upstream",
            Self::RateLimited { .. } => "rate_limited",
            Self::Authentication(_) => "authentication",
            Self::Blocked { .. } => "blocked",
            Self::EmptyResponse => "empty_response",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
            Self::NotConfigured(_) => "not_configured",
        }
    }
}
