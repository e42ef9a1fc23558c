//! CLI command implementations

pub mod clear;
pub mod config;
pub mod list;
pub mod path;
pub mod remove;
pub mod show;

pub use clear::execute as clear;
pub use config::execute as config;
pub use list::execute as list;
pub use path::execute as path;
pub use remove::execute as remove;
pub use show::execute as show;
