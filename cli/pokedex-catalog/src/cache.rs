//! Memoization of immutable catalog responses.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

/// Parsed response bodies keyed by request URL.
///
/// Entries are never evicted, catalog resources are immutable reference data.
/// Cloning yields another handle to the same map, so a cache can be shared
/// between a client and whoever constructed it.
/// Concurrent inserts for the same URL store identical data,
/// so the last writer winning is harmless.
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Value> {
        // A poisoned lock only means a writer panicked mid-insert of an
        // immutable value, the map itself is still consistent.
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(url).cloned()
    }

    pub fn insert(&self, url: impl Into<String>, value: Value) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(url.into(), value);
    }

    pub fn contains(&self, url: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
