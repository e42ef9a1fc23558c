//! Fake connections for exercising the cache without a network

use super::connection::{Connection, ConnectionFactory};
use crate::discovery::{AuthType, DiscoveryRecord, RetryPolicy};
use crate::error::{CacheError, CacheResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Credentials carrying a secret that must never reach disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FakeCredentials {
    pub username: String,
    pub password: String,
}

impl FakeCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    pub record: DiscoveryRecord,
    pub credentials: FakeCredentials,
    closes: AtomicUsize,
    fail_close: AtomicBool,
    closed_total: Arc<AtomicUsize>,
}

impl FakeConnection {
    pub fn new(record: DiscoveryRecord, credentials: FakeCredentials) -> Self {
        Self {
            record,
            credentials,
            closes: AtomicUsize::new(0),
            fail_close: AtomicBool::new(false),
            closed_total: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn fail_on_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }
}

impl Connection for FakeConnection {
    fn service_endpoint(&self) -> &str {
        &self.record.service_endpoint
    }

    fn auth_type(&self) -> AuthType {
        self.record.auth_type
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.record.retry_policy
    }

    fn close(&self) -> CacheResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.closed_total.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(CacheError::close_failed(self.service_endpoint(), "socket already gone"));
        }
        Ok(())
    }
}

/// Factory that counts how many connections it built and closed
#[derive(Default)]
pub struct FakeFactory {
    pub built: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ConnectionFactory for FakeFactory {
    type Credentials = FakeCredentials;
    type Connection = FakeConnection;

    fn connect(
        &self,
        record: DiscoveryRecord,
        credentials: &FakeCredentials,
    ) -> CacheResult<FakeConnection> {
        self.built.fetch_add(1, Ordering::SeqCst);
        let mut connection = FakeConnection::new(record, credentials.clone());
        connection.closed_total = Arc::clone(&self.closed);
        Ok(connection)
    }
}

pub fn ews_record(domain: &str) -> DiscoveryRecord {
    DiscoveryRecord::new(
        format!("https://mail.{domain}/EWS/Exchange.asmx"),
        AuthType::Ntlm,
        RetryPolicy::FaultTolerant { max_wait_secs: 3600 },
    )
}
