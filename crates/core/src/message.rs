//! Conversation value objects.
//!
//! A `Turn` is what the session stores; a `ChatTurn` is what the generation
//! service receives. The two are kept apart so that the wire shape
//! (`role` + `parts`) never leaks into session storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting
    User,
    /// The language model
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who sent this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a model turn.
    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }
}

/// One entry of the context sent to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub parts: Vec<String>,
}

impl ChatTurn {
    /// A turn with a single text part.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![text.into()],
        }
    }

    /// All parts joined, for logging and assertions.
    pub fn joined(&self) -> String {
        self.parts.concat()
    }
}

impl From<&Turn> for ChatTurn {
    fn from(turn: &Turn) -> Self {
        Self::text(turn.role, turn.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_turns() {
        let turn = Turn::user("จอคอมราคาเท่าไหร่");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "จอคอมราคาเท่าไหร่");

        let turn = Turn::model("500 THB");
        assert_eq!(turn.role, Role::Model);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Model).unwrap();
        assert_eq!(json, "\"model\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn chat_turn_from_turn_keeps_role_and_text() {
        let turn = Turn::model("hello");
        let chat = ChatTurn::from(&turn);
        assert_eq!(chat.role, Role::Model);
        assert_eq!(chat.parts, vec!["hello".to_string()]);
        assert_eq!(chat.joined(), "hello");
    }
}
