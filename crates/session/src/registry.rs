//! Many independent sessions served from one process.
//!
//! Each session sits behind its own async mutex. A request handler holds that
//! lock for the whole generation call, so no other mutation of the same
//! history can interleave with an outstanding request, while other sessions
//! proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::history::{Greetings, SessionHistory, SessionId};

/// Shared, lockable handle to one session.
pub type SessionHandle = Arc<Mutex<SessionHistory>>;

struct Entry {
    /// Tick of the most recent `create` or `get`.
    last_used: AtomicU64,
    handle: SessionHandle,
}

/// Owns every live session of the gateway.
pub struct SessionRegistry {
    greetings: Greetings,
    max_stored_turns: Option<usize>,
    max_sessions: usize,
    sessions: RwLock<HashMap<SessionId, Entry>>,
    clock: AtomicU64,
}

impl SessionRegistry {
    pub fn new(greetings: Greetings, max_sessions: usize) -> Self {
        Self {
            greetings,
            max_stored_turns: None,
            max_sessions: max_sessions.max(1),
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
        }
    }

    /// Storage cap applied to every session this registry creates.
    pub fn with_max_stored_turns(mut self, cap: Option<usize>) -> Self {
        self.max_stored_turns = cap;
        self
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a session, evicting the least recently used one when at
    /// capacity.
    pub async fn create(&self) -> (SessionId, SessionHandle) {
        let history =
            SessionHistory::new(self.greetings.clone()).with_max_stored_turns(self.max_stored_turns);
        let id = history.id().clone();
        let entry = Entry {
            last_used: AtomicU64::new(self.tick()),
            handle: Arc::new(Mutex::new(history)),
        };
        let handle = entry.handle.clone();

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            if let Some(idle) = sessions
                .iter()
                .min_by_key(|(_, e)| e.last_used.load(Ordering::Relaxed))
                .map(|(k, _)| k.clone())
            {
                info!(session = %idle, "Session limit reached, evicting least recently used");
                sessions.remove(&idle);
            }
        }
        sessions.insert(id.clone(), entry);
        debug!(session = %id, live = sessions.len(), "Session created");

        (id, handle)
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(id)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(entry.handle.clone())
    }

    /// Destroy a session. Returns whether it existed.
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
