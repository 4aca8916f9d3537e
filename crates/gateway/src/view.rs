//! Explicit rendering of session state.
//!
//! Every handler that mutates a session finishes by calling [`render`] on
//! the current history, so clients never reconstruct state themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tablechat_core::error::GenerationError;
use tablechat_core::message::Role;
use tablechat_session::SessionHistory;

/// One rendered turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnView {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A failure attached to the current turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorView {
    pub kind: String,
    /// Display text, already prefixed for the user.
    pub message: String,
}

impl ErrorView {
    pub fn from_generation(error: &GenerationError, prefix: &str) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: format!("{prefix}: {error}"),
        }
    }
}

/// Everything a client needs to draw a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub turns: Vec<TurnView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
}

/// Render `history`, with an optional error banner.
pub fn render(history: &SessionHistory, error: Option<ErrorView>) -> SessionView {
    SessionView {
        session_id: history.id().to_string(),
        turns: history
            .turns()
            .iter()
            .map(|t| TurnView {
                role: t.role,
                content: t.content.clone(),
                timestamp: t.timestamp,
            })
            .collect(),
        error,
    }
}
