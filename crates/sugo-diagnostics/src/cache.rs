//! Line-indexed cache of file contents.

use rustc_hash::FxHashMap;
use source_map::LineIndex;
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable line indexes of file contents, keyed by file name.
///
/// Entries are replaced whole on regeneration; readers keep the `Arc` they
/// obtained, so a render never observes a half-updated file.
#[derive(Debug, Default)]
pub struct LineCache {
    files: RwLock<FxHashMap<String, Arc<LineIndex>>>,
}

impl LineCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `text` for `file`, replacing any previous contents.
    pub fn insert(&self, file: impl Into<String>, text: &str) -> Arc<LineIndex> {
        let index = Arc::new(LineIndex::new(text));
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file.into(), Arc::clone(&index));
        index
    }

    /// Returns the cached contents of `file`.
    pub fn get(&self, file: &str) -> Option<Arc<LineIndex>> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file)
            .cloned()
    }

    /// Drops the cached contents of `file`.
    pub fn invalidate(&self, file: &str) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(file);
    }
}
