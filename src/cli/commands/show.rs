//! Show command - print one cached record

use crate::cli::args::{OutputFormat, ShowArgs};
use crate::config::Config;
use crate::discovery::RetryPolicy;
use crate::error::CacheResult;
use crate::store::PersistentStore;
use crate::ui::{self, UiContext};

/// Execute the show command
pub fn execute(args: ShowArgs, config: &Config) -> CacheResult<()> {
    let store = PersistentStore::from_config(&config.cache);
    let record = store.get(&args.domain)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Plain => println!("{}", record.service_endpoint),
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::intro(&ctx, &args.domain);
            ui::key_value(&ctx, "Endpoint", &record.service_endpoint);
            ui::key_value(&ctx, "Auth type", record.auth_type.as_str());
            ui::key_value(&ctx, "Retry policy", &describe_retry(&record.retry_policy));
        }
    }

    Ok(())
}

fn describe_retry(policy: &RetryPolicy) -> String {
    match policy {
        RetryPolicy::FailFast => "fail fast".to_string(),
        RetryPolicy::FaultTolerant { max_wait_secs } => {
            format!("fault tolerant (max wait {}s)", max_wait_secs)
        }
    }
}
