//! Two-tier cache facade
//!
//! Reads go to the in-memory index first and fall back to the persistent
//! store. Writes go to the persistent store first, then the index: a crash in
//! between leaves the store correct and the next lookup rebuilds the handle.

use super::connection::{Connection, ConnectionFactory};
use super::index::InMemoryIndex;
use super::key::CacheKey;
use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::store::PersistentStore;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Guard returned by [`AutodiscoverCache::enter`]
pub type CriticalSection<'a> = ReentrantMutexGuard<'a, ()>;

type Key<F> = CacheKey<<F as ConnectionFactory>::Credentials>;
type Handle<F> = Arc<<F as ConnectionFactory>::Connection>;

/// Cache of autodiscover results, shared across threads and processes
///
/// Build one per process and pass it (usually behind an `Arc`) to whatever
/// needs it. Dropping the cache closes every connection it still holds.
pub struct AutodiscoverCache<F: ConnectionFactory> {
    factory: F,
    store: PersistentStore,
    index: InMemoryIndex<F::Credentials, F::Connection>,
    lock: ReentrantMutex<()>,
}

impl<F: ConnectionFactory> AutodiscoverCache<F> {
    /// Create a cache over an explicit persistent store
    pub fn new(factory: F, store: PersistentStore) -> Self {
        Self {
            factory,
            store,
            index: InMemoryIndex::new(),
            lock: ReentrantMutex::new(()),
        }
    }

    /// Create a cache over the current user's store in the temp directory
    pub fn open_default(factory: F) -> Self {
        Self::new(factory, PersistentStore::default_location())
    }

    /// Create a cache over the store described by configuration
    pub fn from_config(factory: F, config: &CacheConfig) -> Self {
        Self::new(factory, PersistentStore::from_config(config))
    }

    /// The persistent tier
    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    /// The connection factory
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Check whether a domain is cached. Only the persistent tier decides.
    pub fn contains(&self, domain: &str) -> CacheResult<bool> {
        self.store.contains(domain)
    }

    /// Get a connection for `key`
    ///
    /// Returns the in-memory handle if there is one. Otherwise builds a new
    /// handle from the persisted record and the key's credentials. Fails with
    /// `NotFound` when the domain is not cached at all.
    pub fn lookup(&self, key: &Key<F>) -> CacheResult<Handle<F>> {
        if let Some(connection) = self.index.get(key) {
            return Ok(connection);
        }

        let record = self.store.get(key.domain())?;
        let connection = Arc::new(self.factory.connect(record, key.credentials())?);
        debug!("Domain {}: built connection from persistent cache", key.domain());

        // A concurrent lookup may have won; hand out whichever handle is indexed.
        Ok(self.index.set_if_absent(key.clone(), connection))
    }

    /// Cache a connection for `key`
    ///
    /// Persists the connection's endpoint, auth type and retry policy under the
    /// domain, then indexes the handle. Credentials are never persisted.
    pub fn insert(&self, key: Key<F>, connection: Handle<F>) -> CacheResult<()> {
        self.store.set(key.domain(), &connection.record())?;

        let domain = key.domain().to_string();
        if self.index.set(key, connection).is_some() {
            debug!("Domain {}: replaced cached connection", domain);
        }
        Ok(())
    }

    /// Forget `key` in both tiers
    ///
    /// The domain leaves the store, so handles cached for it under other
    /// credentials are dropped too. Absent entries are fine: several callers
    /// may purge the same failed domain at once. The index entries are
    /// removed even if the store fails.
    pub fn remove(&self, key: &Key<F>) -> CacheResult<()> {
        let persisted = self.store.delete(key.domain()).map(|_| ());
        let dropped = self.index.delete_domain(key.domain()).len();
        if dropped > 1 {
            debug!("Domain {}: dropped {} cached connections", key.domain(), dropped);
        }
        persisted
    }

    /// Wipe both tiers. Handles are dropped without being closed.
    pub fn clear(&self) -> CacheResult<()> {
        self.store.clear()?;
        self.index.clear();
        Ok(())
    }

    /// Close every cached connection and empty the index
    ///
    /// The persistent tier is untouched. Every handle is closed even if some
    /// fail; the first failure is returned.
    pub fn close(&self) -> CacheResult<()> {
        let mut first_error = None;

        for (key, connection) in self.index.drain() {
            debug!("Domain {}: closing sessions", key.domain());
            if let Err(e) = connection.close() {
                warn!("Domain {}: failed to close connection ({})", key.domain(), e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Enter the cache's critical section
    ///
    /// Reentrant for the calling thread. Hold the guard across a
    /// lookup/discover/insert sequence to make it atomic within this process.
    /// Other processes are not excluded.
    pub fn enter(&self) -> CriticalSection<'_> {
        self.lock.lock()
    }

    /// Run `f` inside the critical section
    pub fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// Look up `key`, running `discover` and caching its result on a miss
    ///
    /// Atomic within this process. Across processes two callers may both
    /// discover; the last write wins.
    pub fn get_or_insert_with(
        &self,
        key: &Key<F>,
        discover: impl FnOnce(&str, &F::Credentials) -> CacheResult<Handle<F>>,
    ) -> CacheResult<Handle<F>> {
        let _guard = self.enter();

        match self.lookup(key) {
            Err(e) if e.is_not_found() => {
                debug!("Domain {}: not cached, running discovery", key.domain());
                let connection = discover(key.domain(), key.credentials())?;
                self.insert(key.clone(), Arc::clone(&connection))?;
                Ok(connection)
            }
            result => result,
        }
    }

    /// Number of live connections held in memory
    pub fn cached_connections(&self) -> usize {
        self.index.len()
    }
}

impl<F: ConnectionFactory> fmt::Debug for AutodiscoverCache<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut endpoints = Vec::new();
        self.index.for_each(|key, connection| {
            endpoints.push(format!("{} -> {}", key.domain(), connection.service_endpoint()));
        });
        endpoints.sort();

        f.debug_struct("AutodiscoverCache")
            .field("store", &self.store.path())
            .field("connections", &endpoints)
            .finish()
    }
}

impl<F: ConnectionFactory> Drop for AutodiscoverCache<F> {
    fn drop(&mut self) {
        // Teardown never fails, not even on a panicking connection.
        match panic::catch_unwind(AssertUnwindSafe(|| self.close())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Ignoring error while closing cache: {}", e),
            Err(_) => debug!("Ignoring panic while closing cache"),
        }
    }
}
