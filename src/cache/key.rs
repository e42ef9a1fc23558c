//! Composite key of the in-memory tier

use std::fmt;
use std::hash::Hash;

/// (domain, credentials) pair identifying one live connection
///
/// Only `domain` ever reaches the persistent store. Several credential sets
/// may share one domain's discovery record, each with its own connection.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey<C> {
    domain: String,
    credentials: C,
}

impl<C> CacheKey<C>
where
    C: Clone + Eq + Hash,
{
    /// Create a new key
    pub fn new(domain: impl Into<String>, credentials: C) -> Self {
        Self {
            domain: domain.into(),
            credentials,
        }
    }

    /// Email domain, the persistence key
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Credential identity, the in-memory discriminator
    pub fn credentials(&self) -> &C {
        &self.credentials
    }
}

// Credentials stay out of logs and panic messages.
impl<C> fmt::Debug for CacheKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field("domain", &self.domain)
            .field("credentials", &"<redacted>")
            .finish()
    }
}
