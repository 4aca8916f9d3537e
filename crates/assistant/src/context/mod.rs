//! Per-request context construction.
//!
//! Every request carries, in order:
//!
//! | Position | Role | Content |
//! |----------|------|---------|
//! | 1 | user | grounding preamble followed by the whole knowledge table |
//! | 2 | model | fixed acknowledgment |
//! | 3.. | as stored | the most recent session turns |
//!
//! The live prompt travels separately as the message being sent.

pub mod assembler;
pub mod token;

pub use assembler::{AssembledContext, ContextAssembler};
