//! Autodiscover cache
//!
//! Remembers where a mail domain's service endpoint lives, how to
//! authenticate against it, and how to retry, so that neither this process
//! nor any other on the host repeats an expensive autodiscover negotiation.

pub mod cache;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod store;
pub mod ui;

pub use cache::{AutodiscoverCache, CacheKey, Connection, ConnectionFactory};
pub use discovery::{AuthType, DiscoveryRecord, RetryPolicy};
pub use error::{CacheError, CacheResult};
pub use store::{PersistentStore, StorageIdentity};
