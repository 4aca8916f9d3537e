//! Grounded context assembly.
//!
//! # Determinism
//!
//! Identical inputs always produce identical outputs. Nothing random or
//! time-dependent is consulted during assembly.
//!
//! # Scalability
//!
//! The whole knowledge table is resent on every request. That is fine while
//! the table fits comfortably in the model's context window; the
//! `estimated_tokens` figure on the result makes the cost visible.

use crate::context::token;
use tablechat_config::PromptConfig;
use tablechat_core::message::{ChatTurn, Role, Turn};
use tablechat_knowledge::KnowledgeBlob;

/// The context for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    /// Grounding turns followed by recent history.
    pub turns: Vec<ChatTurn>,
    /// The live message, sent after `turns`.
    pub prompt: String,
    /// Rough size of `turns` plus `prompt`.
    pub estimated_tokens: usize,
}

/// Builds the grounded turn list. Stateless apart from its two fixed texts.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    preamble: String,
    acknowledgment: String,
}

impl ContextAssembler {
    pub fn new(preamble: impl Into<String>, acknowledgment: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            acknowledgment: acknowledgment.into(),
        }
    }

    pub fn from_config(prompts: &PromptConfig) -> Self {
        Self::new(&prompts.grounding_preamble, &prompts.grounding_ack)
    }

    /// Assemble the context for `prompt`.
    ///
    /// `recent` is expected to already be the window read from the session
    /// (`SessionHistory::recent`); it is mapped 1:1 without further trimming.
    pub fn build(&self, blob: &KnowledgeBlob, recent: &[Turn], prompt: &str) -> AssembledContext {
        let mut turns = Vec::with_capacity(recent.len() + 2);

        let mut grounding = String::with_capacity(self.preamble.len() + blob.text().len());
        grounding.push_str(&self.preamble);
        grounding.push_str(blob.text());

        turns.push(ChatTurn::text(Role::User, grounding));
        turns.push(ChatTurn::text(Role::Model, self.acknowledgment.clone()));
        turns.extend(recent.iter().map(ChatTurn::from));

        let estimated_tokens = token::estimate_turns_tokens(&turns) + token::estimate_tokens(prompt);

        AssembledContext {
            turns,
            prompt: prompt.to_string(),
            estimated_tokens,
        }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::from_config(&PromptConfig::default())
    }
}
