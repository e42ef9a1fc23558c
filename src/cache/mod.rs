//! Two-tier autodiscover cache
//!
//! Stores the translation (email domain, credentials) -> connection so that
//! TCP sessions to an autodiscover server can be reused within one process,
//! and persists the non-sensitive domain -> (endpoint, auth type, retry
//! policy) translation so other processes can skip discovery entirely.
//!
//! # Tiers
//!
//! | Tier | Key | Value | Scope |
//! |------|-----|-------|-------|
//! | [`InMemoryIndex`] | (domain, credentials) | live connection | this process |
//! | [`PersistentStore`](crate::store::PersistentStore) | domain | discovery record | every process of this user |
//!
//! Credentials never leave memory: the persistent file may be readable by
//! other local users.
//!
//! If a discovery result stops working, purge it with
//! [`AutodiscoverCache::remove`].

pub mod connection;
pub mod facade;
pub mod index;
pub mod key;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{Connection, ConnectionFactory};
pub use facade::{AutodiscoverCache, CriticalSection};
pub use index::InMemoryIndex;
pub use key::CacheKey;
