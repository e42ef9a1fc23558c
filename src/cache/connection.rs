//! Seam to the connection objects the cache hands out
//!
//! The cache never looks inside a connection beyond these accessors. How a
//! connection is built from a discovery record and credentials is the
//! factory's business.

use crate::discovery::{AuthType, DiscoveryRecord, RetryPolicy};
use crate::error::CacheResult;
use std::hash::Hash;

/// A live, resource-holding client bound to one discovery record
pub trait Connection: Send + Sync {
    /// Service endpoint URL
    fn service_endpoint(&self) -> &str;

    /// Negotiated authentication mechanism
    fn auth_type(&self) -> AuthType;

    /// Retry policy in effect
    fn retry_policy(&self) -> &RetryPolicy;

    /// Release network resources held by this connection
    fn close(&self) -> CacheResult<()>;

    /// The persistable part of this connection. Never includes credentials.
    fn record(&self) -> DiscoveryRecord {
        DiscoveryRecord {
            service_endpoint: self.service_endpoint().to_string(),
            auth_type: self.auth_type(),
            retry_policy: self.retry_policy().clone(),
        }
    }
}

/// Builds connections from cached discovery records
pub trait ConnectionFactory: Send + Sync {
    /// Credential identity; part of the in-memory key, never persisted
    type Credentials: Clone + Eq + Hash + Send + Sync;

    /// Connection type produced
    type Connection: Connection;

    /// Build a connection for `record` authenticated with `credentials`
    fn connect(
        &self,
        record: DiscoveryRecord,
        credentials: &Self::Credentials,
    ) -> CacheResult<Self::Connection>;
}
