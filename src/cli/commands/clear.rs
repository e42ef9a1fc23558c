//! Clear command - purge every cached domain

use crate::cli::args::ClearArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::store::PersistentStore;
use crate::ui::{self, UiContext};

/// Execute the clear command
pub fn execute(args: ClearArgs, config: &Config) -> CacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let store = PersistentStore::from_config(&config.cache);
    let count = store.len()?;

    if count == 0 {
        ui::step_info(&ctx, "No cached domains to clear");
        return Ok(());
    }

    let prompt = format!("Remove {} cached domain(s)?", count);
    if !ui::confirm(&ctx, &prompt, false)? {
        ui::remark(&ctx, "Aborted.");
        return Ok(());
    }

    let removed = store.clear()?;
    ui::step_ok(&ctx, &format!("Cleared {} domain(s)", removed));

    Ok(())
}
