//! Load-once memo for the knowledge table.
//!
//! The first `get()` reads the file; every later call, from any thread,
//! returns the same result without touching the filesystem again. Failures
//! are memoized too: a missing file stays missing for the process lifetime.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tablechat_core::error::LoadError;
use tracing::debug;

use crate::loader::{self, KnowledgeBlob};

/// Process-lifetime cache of one knowledge file.
pub struct KnowledgeCache {
    path: PathBuf,
    cell: OnceLock<Result<Arc<KnowledgeBlob>, LoadError>>,
}

impl KnowledgeCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceLock::new(),
        }
    }

    /// A cache that is already populated, e.g. with an in-memory table.
    pub fn preloaded(blob: KnowledgeBlob) -> Self {
        let cell = OnceLock::new();
        let path = blob.source().to_path_buf();
        let _ = cell.set(Ok(Arc::new(blob)));
        Self { path, cell }
    }

    /// The loaded blob, reading the file on first use only.
    pub fn get(&self) -> Result<Arc<KnowledgeBlob>, LoadError> {
        self.cell
            .get_or_init(|| {
                debug!(path = %self.path.display(), "Loading knowledge table");
                loader::load(&self.path).map(Arc::new)
            })
            .clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a load has been attempted.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
