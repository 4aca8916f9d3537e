//! Grounded question answering for TableChat.
//!
//! Each request is answered from a fixed knowledge table:
//!
//! 1. **Receive** a prompt for a session
//! 2. **Build context** (grounding preamble + full table + acknowledgment + recent turns)
//! 3. **Send** to the configured generator
//! 4. **Record** the reply in the session, or surface the error and leave
//!    the session as it was

pub mod context;
pub mod orchestrator;

#[cfg(test)]
mod test_helpers;

pub use context::{AssembledContext, ContextAssembler};
pub use orchestrator::{Assistant, AssistantError, RequestState};
