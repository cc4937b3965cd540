//! Whole-map commands: clear, prune, purge

use super::open_cache;
use crate::cache::Ttl;
use crate::cli::args::StoreArgs;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::store;
use console::style;

/// Execute the clear command
pub fn clear(args: StoreArgs, config: &Config) -> CacheResult<()> {
    let mut cache = open_cache(&args, Ttl::Infinite, config)?;
    cache.clear()?;

    println!("{} Cleared {}", style("✓").green(), style(display_name(&args)).cyan());
    Ok(())
}

/// Execute the prune command
pub fn prune(args: StoreArgs, config: &Config) -> CacheResult<()> {
    let mut cache = open_cache(&args, Ttl::Infinite, config)?;
    let evicted = cache.prune()?;

    println!(
        "{} Pruned {} expired entr{} from {}",
        style("✓").green(),
        evicted,
        if evicted == 1 { "y" } else { "ies" },
        style(display_name(&args)).cyan()
    );
    Ok(())
}

/// Execute the purge command
pub fn purge(args: StoreArgs, config: &Config) -> CacheResult<()> {
    let name = args
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or(CacheError::MissingStorageName)?;

    if store::purge(name, config)? {
        println!("{} Removed storage for {}", style("✓").green(), style(name).cyan());
    } else {
        println!("{} No storage for {}", style("!").yellow(), style(name).cyan());
    }
    Ok(())
}

fn display_name(args: &StoreArgs) -> &str {
    args.name.as_deref().unwrap_or_default()
}
