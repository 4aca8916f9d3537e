//! # TableChat Core
//!
//! Domain types, traits, and error definitions for the TableChat service.
//! This crate has **no framework dependencies**: it defines the conversation
//! model, the generation contract, and the error taxonomy that every other
//! crate implements against.
//!
//! ## Design Philosophy
//!
//! The remote text-generation service is a trait here (`Generator`) and its
//! implementations live in `tablechat-providers`. This keeps the
//! orchestration and HTTP layers testable with scripted generators and keeps
//! the dependency graph pointing inward.

pub mod error;
pub mod generation;
pub mod message;

// Re-export key types at crate root for ergonomics
pub use error::{GenerationError, LoadError};
pub use generation::{
    BlockThreshold, GenerationConfig, GenerationRequest, GenerationResponse, Generator,
    HarmCategory, SafetyPolicy, Usage,
};
pub use message::{ChatTurn, Role, Turn};
