use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// `(host identity, normalized parent directory)`
pub type CacheKey = (String, String);

/// Full, unfiltered child-directory listings per remote directory.
///
/// Cloning shares the underlying map so the input path and detached
/// fetches write into the same cache. Entries live until `clear()` or
/// process exit.
#[derive(Debug, Clone, Default)]
pub struct CompletionCache {
    entries: Arc<Mutex<HashMap<CacheKey, Vec<String>>>>,
}

impl CompletionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Vec<String>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn key(host_identity: &str, directory: &str) -> CacheKey {
        (host_identity.to_string(), directory.to_string())
    }

    pub fn get(&self, key: &CacheKey) -> Option<Vec<String>> {
        self.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn insert(&self, key: CacheKey, children: Vec<String>) {
        self.lock().insert(key, children);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
