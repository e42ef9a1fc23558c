//! File-backed discovery store shared by every process on the host
//!
//! Each operation opens the database, performs one statement, and closes it
//! again. No handle outlives a call, so processes only contend on the file for
//! the duration of a single read or write.

use crate::config::CacheConfig;
use crate::discovery::{AuthType, DiscoveryRecord, RetryPolicy};
use crate::error::{CacheError, CacheResult};
use crate::store::identity::StorageIdentity;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

// Changing these columns requires bumping FORMAT_VERSION.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS discovery (
    domain TEXT PRIMARY KEY NOT NULL,
    service_endpoint TEXT NOT NULL,
    auth_type TEXT NOT NULL,
    retry_policy TEXT NOT NULL
)";

const LAYOUT_CHECK: &str =
    "SELECT domain, service_endpoint, auth_type, retry_policy FROM discovery LIMIT 0";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable domain -> [`DiscoveryRecord`] mapping
#[derive(Debug, Clone)]
pub struct PersistentStore {
    path: PathBuf,
    busy_timeout: Duration,
}

/// Raw column values of one row, before validation
struct StoredRow {
    service_endpoint: String,
    auth_type: String,
    retry_policy: String,
}

impl StoredRow {
    fn decode(self) -> Result<DiscoveryRecord, String> {
        let auth_type: AuthType = self.auth_type.parse()?;
        let retry_policy: RetryPolicy =
            serde_json::from_str(&self.retry_policy).map_err(|e| e.to_string())?;
        Ok(DiscoveryRecord {
            service_endpoint: self.service_endpoint,
            auth_type,
            retry_policy,
        })
    }
}

impl PersistentStore {
    /// Create a store backed by the database at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Store for the current user in the system temp directory
    pub fn default_location() -> Self {
        Self::from_config(&CacheConfig::default())
    }

    /// Store located and tuned by configuration
    pub fn from_config(config: &CacheConfig) -> Self {
        let identity = StorageIdentity::resolve(&config.fallback_user);
        Self::new(identity.path_in(&config.directory()))
            .with_busy_timeout(Duration::from_millis(config.busy_timeout_ms))
    }

    /// Set how long to wait on a database locked by another process
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether a domain has a cached record
    pub fn contains(&self, domain: &str) -> CacheResult<bool> {
        self.with_db(|db| {
            Ok(db.query_row(
                "SELECT EXISTS(SELECT 1 FROM discovery WHERE domain = ?1)",
                params![domain],
                |row| row.get(0),
            )?)
        })
    }

    /// Get the record for a domain, failing with `NotFound` if absent
    pub fn get(&self, domain: &str) -> CacheResult<DiscoveryRecord> {
        let row = self.with_db(|db| {
            Ok(db
                .query_row(
                    "SELECT service_endpoint, auth_type, retry_policy
                     FROM discovery WHERE domain = ?1",
                    params![domain],
                    |row| {
                        Ok(StoredRow {
                            service_endpoint: row.get(0)?,
                            auth_type: row.get(1)?,
                            retry_policy: row.get(2)?,
                        })
                    },
                )
                .optional()?)
        })?;

        let Some(row) = row else {
            return Err(CacheError::NotFound(domain.to_string()));
        };

        match row.decode() {
            Ok(record) => Ok(record),
            Err(reason) => {
                warn!("Dropping unreadable cache entry for {} ({})", domain, reason);
                self.delete(domain)?;
                Err(CacheError::NotFound(domain.to_string()))
            }
        }
    }

    /// Store the record for a domain, replacing any previous one
    pub fn set(&self, domain: &str, record: &DiscoveryRecord) -> CacheResult<()> {
        let retry_policy = serde_json::to_string(&record.retry_policy)?;

        self.with_db(|db| {
            db.execute(
                "INSERT OR REPLACE INTO discovery
                 (domain, service_endpoint, auth_type, retry_policy)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    domain,
                    record.service_endpoint,
                    record.auth_type.as_str(),
                    retry_policy
                ],
            )?;
            Ok(())
        })?;

        debug!("Persisted discovery record for {}", domain);
        Ok(())
    }

    /// Delete the record for a domain. Returns whether a record existed.
    pub fn delete(&self, domain: &str) -> CacheResult<bool> {
        let removed = self.with_db(|db| {
            Ok(db.execute("DELETE FROM discovery WHERE domain = ?1", params![domain])?)
        })?;

        if removed > 0 {
            debug!("Deleted discovery record for {}", domain);
        }
        Ok(removed > 0)
    }

    /// Remove every record. Returns the number removed.
    pub fn clear(&self) -> CacheResult<usize> {
        let removed = self.with_db(|db| Ok(db.execute("DELETE FROM discovery", [])?))?;
        debug!("Cleared {} discovery record(s)", removed);
        Ok(removed)
    }

    /// Number of cached domains
    pub fn len(&self) -> CacheResult<usize> {
        self.with_db(|db| {
            let count: i64 = db.query_row("SELECT COUNT(*) FROM discovery", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
    }

    /// Check whether the store holds no records
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// All readable records, ordered by domain
    pub fn entries(&self) -> CacheResult<Vec<(String, DiscoveryRecord)>> {
        let rows = self.with_db(|db| {
            let mut stmt = db.prepare(
                "SELECT domain, service_endpoint, auth_type, retry_policy
                 FROM discovery ORDER BY domain",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        StoredRow {
                            service_endpoint: row.get(1)?,
                            auth_type: row.get(2)?,
                            retry_policy: row.get(3)?,
                        },
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let mut entries = Vec::with_capacity(rows.len());
        for (domain, row) in rows {
            match row.decode() {
                Ok(record) => entries.push((domain, record)),
                Err(reason) => warn!("Skipping unreadable cache entry for {} ({})", domain, reason),
            }
        }
        Ok(entries)
    }

    /// Run one operation against a freshly opened database
    fn with_db<T>(&self, op: impl FnOnce(&Connection) -> CacheResult<T>) -> CacheResult<T> {
        let db = self.open()?;
        op(&db)
    }

    /// Open the database, recreating it once if it is unreadable
    fn open(&self) -> CacheResult<Connection> {
        let dir = self.directory();
        fs::create_dir_all(dir)
            .map_err(|e| CacheError::io(format!("creating cache directory {}", dir.display()), e))?;

        match self.try_open() {
            Ok(db) => Ok(db),
            Err(e) if is_contention(&e) => Err(CacheError::StorageUnavailable {
                path: self.path.clone(),
                source: e,
            }),
            Err(e) => {
                self.remove_files(&e);
                self.try_open()
                    .map_err(|source| CacheError::StorageUnavailable {
                        path: self.path.clone(),
                        source,
                    })
            }
        }
    }

    fn try_open(&self) -> rusqlite::Result<Connection> {
        let db = Connection::open(&self.path)?;
        db.busy_timeout(self.busy_timeout)?;
        db.execute_batch(SCHEMA)?;
        db.prepare(LAYOUT_CHECK)?;
        Ok(db)
    }

    /// Delete the database and every sibling file sharing its name as a prefix.
    /// We cannot tell which file is broken, so all of them go. Failures are
    /// logged and skipped; the retry that follows decides the outcome.
    fn remove_files(&self, reason: &rusqlite::Error) {
        let dir = self.directory();
        let Some(prefix) = self.path.file_name().and_then(|n| n.to_str()) else {
            return;
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot scan cache directory {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(prefix) {
                continue;
            }

            let path = entry.path();
            warn!("Deleting invalid cache file {} ({})", path.display(), reason);
            match fs::remove_file(&path) {
                Ok(()) => {}
                // Another process got there first
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not delete cache file {}: {}", path.display(), e),
            }
        }
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

/// Lock contention is not corruption; never delete a file someone else holds
fn is_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
