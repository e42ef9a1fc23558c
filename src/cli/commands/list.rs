//! List command - show cached domains

use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::discovery::DiscoveryRecord;
use crate::error::CacheResult;
use crate::store::PersistentStore;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the list command
pub fn execute(args: ListArgs, config: &Config) -> CacheResult<()> {
    let store = PersistentStore::from_config(&config.cache);
    let entries = store.entries()?;

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No cached domains");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[(String, DiscoveryRecord)]) {
    println!(
        "{:<30} {:<18} {:<50}",
        style("DOMAIN").bold(),
        style("AUTH").bold(),
        style("ENDPOINT").bold()
    );
    println!("{}", "-".repeat(98));

    for (domain, record) in entries {
        println!(
            "{:<30} {:<18} {:<50}",
            domain, record.auth_type, record.service_endpoint
        );
    }

    println!();
    println!("{} domain(s)", entries.len());
}

fn print_json(entries: &[(String, DiscoveryRecord)]) -> CacheResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson<'a> {
        domain: &'a str,
        #[serde(flatten)]
        record: &'a DiscoveryRecord,
    }

    let json: Vec<EntryJson<'_>> = entries
        .iter()
        .map(|(domain, record)| EntryJson { domain, record })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_plain(entries: &[(String, DiscoveryRecord)]) {
    for (domain, _) in entries {
        println!("{}", domain);
    }
}
