//! Single-key commands: set, get, has, delete, expires

use super::open_cache;
use crate::cache::Ttl;
use crate::cli::args::{ExpiresArgs, KeyArgs, SetArgs};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use console::style;
use serde_json::Value;
use tracing::debug;

/// Execute the set command
pub fn set(args: SetArgs, config: &Config) -> CacheResult<()> {
    let ttl = if args.no_expiry {
        Ttl::Infinite
    } else {
        Ttl::from_millis(args.ttl_ms.or(config.cache.default_ttl_ms))
    };

    let mut cache = open_cache(&args.store, ttl, config)?;
    let value = parse_value(args.value);
    debug!(key = %args.key, ttl = ?cache.ttl(), "Setting entry");
    cache.set(args.key.clone(), value)?;

    println!("{} Stored {}", style("✓").green(), style(&args.key).cyan());
    Ok(())
}

/// Execute the get command
pub fn get(args: KeyArgs, config: &Config) -> CacheResult<()> {
    let mut cache = open_cache(&args.store, Ttl::Infinite, config)?;
    let value = cache
        .get(&args.key)?
        .ok_or_else(|| CacheError::KeyNotFound(args.key.clone()))?;

    println!("{}", render_value(&value)?);
    Ok(())
}

/// Execute the has command
pub fn has(args: KeyArgs, config: &Config) -> CacheResult<()> {
    let mut cache = open_cache(&args.store, Ttl::Infinite, config)?;
    println!("{}", cache.has(&args.key)?);
    Ok(())
}

/// Execute the delete command
pub fn delete(args: KeyArgs, config: &Config) -> CacheResult<()> {
    let mut cache = open_cache(&args.store, Ttl::Infinite, config)?;

    if cache.delete(&args.key)? {
        println!("{} Deleted {}", style("✓").green(), style(&args.key).cyan());
    } else {
        println!("{} No entry {}", style("!").yellow(), style(&args.key).cyan());
    }
    Ok(())
}

/// Execute the expires command
pub fn expires(args: ExpiresArgs, config: &Config) -> CacheResult<()> {
    let KeyArgs { store, key } = args.target;
    let mut cache = open_cache(&store, Ttl::Infinite, config)?;
    let expiry = cache
        .expires(&key)?
        .ok_or_else(|| CacheError::KeyNotFound(key.clone()))?;

    if args.epoch_ms {
        match expiry.timestamp_millis() {
            Some(ms) => println!("{ms}"),
            None => println!("null"),
        }
    } else {
        println!("{}", expiry);
    }
    Ok(())
}

/// JSON if it parses, plain string otherwise
fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// Strings print bare so shell callers get the original text back
pub(crate) fn render_value(value: &Value) -> CacheResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}
