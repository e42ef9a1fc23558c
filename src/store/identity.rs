//! Storage identity for the persistent cache file
//!
//! The file name encodes everything that makes two cache files incompatible:
//! the record layout version, the major/minor version of the code that writes
//! it, and the invoking user. Readers that disagree on any of these never open
//! each other's files, and users sharing a temp directory never collide.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Version of the persisted record layout. Bump it whenever the layout changes;
/// old files are then simply orphaned.
pub const FORMAT_VERSION: u32 = 1;

/// User name substituted when the invoking user cannot be determined
pub const FALLBACK_USER: &str = "autodiscover";

const FILE_PREFIX: &str = "autodiscover";

/// Environment variables consulted for the login name, in order
const USER_ENV_VARS: &[&str] = &["LOGNAME", "USER", "LNAME", "USERNAME"];

/// Deterministic identity of a cache file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageIdentity {
    pub format_version: u32,
    pub runtime_major: u32,
    pub runtime_minor: u32,
    pub user: String,
}

impl StorageIdentity {
    /// Identity for the current user and this build
    pub fn current() -> Self {
        Self::resolve(FALLBACK_USER)
    }

    /// Identity for the current user, substituting `fallback_user` when the
    /// user cannot be determined
    pub fn resolve(fallback_user: &str) -> Self {
        let user = current_user().unwrap_or_else(|| {
            debug!(
                "Could not determine current user, using '{}' for cache identity",
                fallback_user
            );
            fallback_user.to_string()
        });
        Self::for_user(user)
    }

    /// Identity for an explicit user and this build
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            runtime_major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or_default(),
            runtime_minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or_default(),
            user: user.into(),
        }
    }

    /// File name of the cache database; sibling files share it as a prefix
    pub fn file_name(&self) -> String {
        format!(
            "{}.{}.cache.{}.rs{}{}",
            FILE_PREFIX,
            self.format_version,
            sanitize(&self.user),
            self.runtime_major,
            self.runtime_minor
        )
    }

    /// Full path of the cache database inside `dir`
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Determine the login name of the invoking user
///
/// Checks the usual environment variables first, then the password database.
pub fn current_user() -> Option<String> {
    USER_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.trim().is_empty())
        .or_else(passwd_user)
}

#[cfg(unix)]
fn passwd_user() -> Option<String> {
    use std::ffi::CStr;

    // SAFETY: getuid has no preconditions and cannot fail.
    let uid = unsafe { libc::getuid() };
    let mut buf: Vec<libc::c_char> = vec![0; 1024];

    loop {
        // SAFETY: passwd is plain data; getpwuid_r fills it on success.
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        // SAFETY: every pointer is valid for the duration of the call and
        // buf.len() is the true size of buf.
        let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };

        if rc == libc::ERANGE && buf.len() < 1 << 16 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
            return None;
        }

        // SAFETY: pw_name points into buf, NUL-terminated by getpwuid_r.
        let name = unsafe { CStr::from_ptr(pwd.pw_name) }
            .to_string_lossy()
            .into_owned();
        return (!name.is_empty()).then_some(name);
    }
}

#[cfg(not(unix))]
fn passwd_user() -> Option<String> {
    None
}

/// Keep user names safe for use inside a single file name
fn sanitize(user: &str) -> String {
    let cleaned: String = user
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        FALLBACK_USER.to_string()
    } else {
        cleaned
    }
}
