//! Session history for TableChat.
//!
//! A `SessionHistory` is the ordered, append-only list of turns of one user
//! session. It is an explicit object owned by whoever serves that user (the
//! terminal loop, or the gateway's `SessionRegistry`) and is passed by
//! reference into each request; nothing here is global.

pub mod history;
pub mod registry;

pub use history::{Greetings, SessionHistory, SessionId};
pub use registry::{SessionHandle, SessionRegistry};
