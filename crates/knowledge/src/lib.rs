//! Knowledge table for TableChat.
//!
//! The knowledge source is a CSV file of question/answer pairs. It is read
//! once, filtered to rows that carry both a `User_query` and a
//! `Chatbot_response`, and flattened into a column-aligned text table that is
//! sent verbatim as grounding context with every request.
//!
//! The whole table is resent on every call; there is no retrieval step. This
//! holds only while the table fits in the model's context window, which is
//! why `KnowledgeBlob::estimated_tokens` exists.

pub mod cache;
pub mod loader;
pub mod table;

pub use cache::KnowledgeCache;
pub use loader::{KnowledgeBlob, KnowledgeRow, RESPONSE_COLUMN, QUERY_COLUMN, load, parse};
