//! List command - show live entries of a map

use super::entry::render_value;
use super::open_cache;
use crate::cache::{CacheEntry, Ttl};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::CacheResult;
use console::style;
use serde_json::Value;

/// Execute the list command
pub fn execute(args: ListArgs, config: &Config) -> CacheResult<()> {
    let mut cache = open_cache(&args.store, Ttl::Infinite, config)?;
    let entries = cache.snapshot()?;

    match args.format {
        OutputFormat::Table => print_table(&entries)?,
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[(String, CacheEntry<Value>)]) -> CacheResult<()> {
    if entries.is_empty() {
        println!("No live entries.");
        return Ok(());
    }

    println!("{:<30} {:<32} {}", "KEY", "EXPIRES", "VALUE");
    println!("{}", "-".repeat(80));

    for (key, entry) in entries {
        let expiry = entry.expiry();
        let expiry_display = if expiry.is_never() {
            style("never".to_string()).dim().to_string()
        } else {
            expiry.to_string()
        };

        println!(
            "{:<30} {:<32} {}",
            key,
            expiry_display,
            render_value(&entry.value)?
        );
    }

    println!();
    println!("Total: {} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    Ok(())
}

fn print_json(entries: &[(String, CacheEntry<Value>)]) -> CacheResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson<'a> {
        key: &'a str,
        #[serde(flatten)]
        entry: &'a CacheEntry<Value>,
    }

    let json: Vec<EntryJson> = entries
        .iter()
        .map(|(key, entry)| EntryJson { key, entry })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_plain(entries: &[(String, CacheEntry<Value>)]) {
    for (key, _) in entries {
        println!("{}", key);
    }
}
