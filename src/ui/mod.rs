//! Terminal output for the `adcache` binary
//!
//! Uses `cliclack` in interactive terminals and falls back to plain,
//! greppable lines when stdout is piped or running under CI.

mod context;
mod output;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{intro, key_value, remark, step_info, step_ok, step_ok_detail, step_warn_hint};
pub use prompts::confirm;
pub use theme::{init_theme, AdcacheTheme};
