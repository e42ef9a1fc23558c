//! Path command - print the cache file location

use crate::config::Config;
use crate::error::CacheResult;
use crate::store::PersistentStore;

/// Execute the path command
pub fn execute(config: &Config) -> CacheResult<()> {
    let store = PersistentStore::from_config(&config.cache);
    println!("{}", store.path().display());
    Ok(())
}
