//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{CacheError, CacheResult};

/// Prompt for confirmation, returns default if non-interactive or auto-yes
pub fn confirm(ctx: &UiContext, message: &str, default: bool) -> CacheResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    cliclack::confirm(message)
        .initial_value(default)
        .interact()
        .map_err(|e| CacheError::User(format!("Prompt failed: {}", e)))
}
