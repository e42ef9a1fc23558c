//! Remove command - purge one domain

use crate::cli::args::RemoveArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::store::PersistentStore;
use console::style;

/// Execute the remove command
pub fn execute(args: RemoveArgs, config: &Config) -> CacheResult<()> {
    let store = PersistentStore::from_config(&config.cache);

    if store.delete(&args.domain)? {
        println!(
            "{} Removed {} from cache",
            style("✓").green(),
            style(&args.domain).cyan()
        );
    } else {
        println!(
            "{} {} was not cached",
            style("!").yellow(),
            style(&args.domain).cyan()
        );
    }

    Ok(())
}
