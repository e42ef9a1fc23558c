//! Persistent tier of the cache
//!
//! Discovery records live in a small SQLite database in the temp directory,
//! named by [`StorageIdentity`] so that incompatible writers and different
//! users never share a file.
//!
//! # Recovery
//!
//! An unreadable database (truncated, garbage, or an unexpected layout) is
//! deleted together with its sibling files and recreated once. Only a second
//! failure reaches the caller.

pub mod identity;
pub mod persistent;

pub use identity::{current_user, StorageIdentity, FALLBACK_USER, FORMAT_VERSION};
pub use persistent::PersistentStore;
