// src/target.rs

//! Output-target capability.
//!
//! The core never writes outputs itself; it only needs to ask whether an
//! output already exists (to decide completeness) and to display it.
//! Filesystem, database, etc. targets live outside this crate and implement
//! [`Target`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// An opaque output handle produced by a task.
pub trait Target: Send + Sync {
    /// Whether the output has been produced. May block on I/O.
    fn exists(&self) -> bool;

    /// Stable identity used for display and comparison.
    fn uri(&self) -> String;
}

/// Shared in-memory existence store backing [`MemoryTarget`]s.
///
/// Useful for wiring tests and for drivers that track completion without
/// real storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    existing: Arc<Mutex<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A target bound to `uri` in this store.
    pub fn target(&self, uri: impl Into<String>) -> MemoryTarget {
        MemoryTarget {
            uri: uri.into(),
            store: self.existing.clone(),
        }
    }

    /// Mark `uri` as produced.
    pub fn put(&self, uri: impl Into<String>) {
        self.existing
            .lock()
            .expect("memory store lock poisoned")
            .insert(uri.into());
    }

    /// Remove `uri` again.
    pub fn remove(&self, uri: &str) {
        self.existing
            .lock()
            .expect("memory store lock poisoned")
            .remove(uri);
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.existing
            .lock()
            .expect("memory store lock poisoned")
            .contains(uri)
    }
}

/// In-memory [`Target`]; exists iff its uri has been `put` into the store.
#[derive(Debug, Clone)]
pub struct MemoryTarget {
    uri: String,
    store: Arc<Mutex<HashSet<String>>>,
}

impl Target for MemoryTarget {
    fn exists(&self) -> bool {
        self.store
            .lock()
            .expect("memory store lock poisoned")
            .contains(&self.uri)
    }

    fn uri(&self) -> String {
        self.uri.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_tracks_store_state() {
        let store = MemoryStore::new();
        let target = store.target("out/a.csv");

        assert!(!target.exists());
        store.put("out/a.csv");
        assert!(target.exists());
        store.remove("out/a.csv");
        assert!(!target.exists());
    }
}
