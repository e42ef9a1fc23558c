//! Discovery results cached per email domain
//!
//! A [`DiscoveryRecord`] is the non-sensitive outcome of an autodiscover
//! negotiation. It is the only thing ever written to the persistent store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authentication mechanism negotiated with a service endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthType {
    NoAuth,
    Ntlm,
    Basic,
    Digest,
    Gssapi,
    Sspi,
    OAuth2,
    Cba,
}

impl AuthType {
    /// Canonical wire name, also used as the persisted value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAuth => "no authentication",
            Self::Ntlm => "NTLM",
            Self::Basic => "basic",
            Self::Digest => "digest",
            Self::Gssapi => "GSSAPI",
            Self::Sspi => "SSPI",
            Self::OAuth2 => "OAuth 2.0",
            Self::Cba => "CBA",
        }
    }

    fn all() -> &'static [Self] {
        &[
            Self::NoAuth,
            Self::Ntlm,
            Self::Basic,
            Self::Digest,
            Self::Gssapi,
            Self::Sspi,
            Self::OAuth2,
            Self::Cba,
        ]
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|auth| auth.as_str() == s)
            .ok_or_else(|| format!("unknown auth type '{s}'"))
    }
}

impl TryFrom<String> for AuthType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AuthType> for String {
    fn from(value: AuthType) -> Self {
        value.as_str().to_string()
    }
}

/// How a connection retries requests against a busy or failing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Give up on the first failure
    #[default]
    FailFast,
    /// Back off and retry for up to `max_wait_secs` in total
    FaultTolerant { max_wait_secs: u64 },
}

/// Non-sensitive discovery result for one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    /// Service endpoint URL
    pub service_endpoint: String,

    /// Negotiated authentication mechanism
    pub auth_type: AuthType,

    /// Retry policy to apply to the endpoint
    pub retry_policy: RetryPolicy,
}

impl DiscoveryRecord {
    /// Create a new discovery record
    pub fn new(
        service_endpoint: impl Into<String>,
        auth_type: AuthType,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            service_endpoint: service_endpoint.into(),
            auth_type,
            retry_policy,
        }
    }
}
