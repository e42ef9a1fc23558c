//! adcache - Autodiscover cache inspector
//!
//! CLI entry point that dispatches to subcommands.

use autodiscover_cache::cli::{commands, Cli, Commands};
use autodiscover_cache::config::{Config, ConfigManager};
use autodiscover_cache::error::CacheResult;
use autodiscover_cache::ui;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load()?;

    init_logging(cli.verbose, &config);
    ui::init_theme();

    if let Some(dir) = cli.cache_dir {
        debug!("Cache directory overridden: {}", dir.display());
        config.cache.directory = Some(dir);
    }

    match cli.command {
        Commands::Path => commands::path(&config),
        Commands::List(args) => commands::list(args, &config),
        Commands::Show(args) => commands::show(args, &config),
        Commands::Remove(args) => commands::remove(args, &config),
        Commands::Clear(args) => commands::clear(args, &config),
        Commands::Config(args) => commands::config(args, &config, &config_manager),
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("autodiscover_cache=warn,adcache=warn"),
        1 => EnvFilter::new("autodiscover_cache=info,adcache=info"),
        _ => EnvFilter::new("autodiscover_cache=debug,adcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
