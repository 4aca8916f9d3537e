//! The per-session turn list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tablechat_core::message::Turn;
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed model turns that open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greetings {
    /// Shown when a session is first created
    pub welcome: String,
    /// Installed by `reset()`
    pub reset: String,
}

impl Greetings {
    /// Same text for both occasions.
    pub fn uniform(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            welcome: text.clone(),
            reset: text,
        }
    }
}

/// Ordered turns of one session.
///
/// Invariant: right after construction or `reset()` the history holds exactly
/// one model turn, the greeting.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    id: SessionId,
    turns: Vec<Turn>,
    greetings: Greetings,
    max_stored_turns: Option<usize>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionHistory {
    /// Start a session with the welcome greeting.
    pub fn new(greetings: Greetings) -> Self {
        let now = Utc::now();
        let turns = vec![Turn::model(greetings.welcome.clone())];
        Self {
            id: SessionId::new(),
            turns,
            greetings,
            max_stored_turns: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bound stored turns; the oldest are evicted on append. A cap of zero is
    /// treated as one.
    pub fn with_max_stored_turns(mut self, cap: Option<usize>) -> Self {
        self.max_stored_turns = cap.map(|c| c.max(1));
        self.enforce_cap();
        self
    }

    /// Replace everything with the reset greeting.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::model(self.greetings.reset.clone()));
        self.updated_at = Utc::now();
    }

    /// Add a turn at the end. No deduplication.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
        self.enforce_cap();
    }

    /// The last `n` turns in chronological order (all of them if fewer).
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Every stored turn, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn greetings(&self) -> &Greetings {
        &self.greetings
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn enforce_cap(&mut self) {
        if let Some(cap) = self.max_stored_turns {
            if self.turns.len() > cap {
                let excess = self.turns.len() - cap;
                self.turns.drain(..excess);
            }
        }
    }
}
