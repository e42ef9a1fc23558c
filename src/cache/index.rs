//! Per-process tier: live connections keyed by (domain, credentials)

use super::key::CacheKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// In-memory map from [`CacheKey`] to a shared connection handle
///
/// Clearing or deleting never closes a handle; that is left to the owner.
pub struct InMemoryIndex<C, H> {
    entries: Mutex<HashMap<CacheKey<C>, Arc<H>>>,
}

impl<C, H> InMemoryIndex<C, H>
where
    C: Clone + Eq + Hash,
{
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey<C>) -> Option<Arc<H>> {
        self.entries.lock().get(key).cloned()
    }

    /// Store a handle, returning the one it displaced
    pub fn set(&self, key: CacheKey<C>, handle: Arc<H>) -> Option<Arc<H>> {
        self.entries.lock().insert(key, handle)
    }

    /// Store a handle unless the key is already taken; returns the handle
    /// that ends up in the index
    pub fn set_if_absent(&self, key: CacheKey<C>, handle: Arc<H>) -> Arc<H> {
        Arc::clone(self.entries.lock().entry(key).or_insert(handle))
    }

    /// Remove a handle if present
    pub fn delete(&self, key: &CacheKey<C>) -> Option<Arc<H>> {
        self.entries.lock().remove(key)
    }

    /// Remove every handle cached for `domain`, whatever its credentials
    pub fn delete_domain(&self, domain: &str) -> Vec<Arc<H>> {
        let mut removed = Vec::new();
        self.entries.lock().retain(|key, handle| {
            if key.domain() == domain {
                removed.push(Arc::clone(handle));
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Visit every entry. The index is locked for the duration; `f` must not
    /// call back into it.
    pub fn for_each(&self, mut f: impl FnMut(&CacheKey<C>, &Arc<H>)) {
        for (key, handle) in self.entries.lock().iter() {
            f(key, handle);
        }
    }

    /// Take every entry out, leaving the index empty
    pub fn drain(&self) -> Vec<(CacheKey<C>, Arc<H>)> {
        self.entries.lock().drain().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Distinct domains with at least one live handle, sorted
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .entries
            .lock()
            .keys()
            .map(|key| key.domain().to_string())
            .collect();
        domains.sort();
        domains.dedup();
        domains
    }
}

impl<C, H> Default for InMemoryIndex<C, H>
where
    C: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
