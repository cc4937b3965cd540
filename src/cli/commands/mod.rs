//! CLI command implementations

pub mod config;
pub mod entry;
pub mod list;
pub mod storage;

pub use config::execute as config;
pub use list::execute as list;

use crate::cache::{ExpiringCache, Ttl};
use crate::cli::args::StoreArgs;
use crate::config::Config;
use crate::error::CacheResult;
use serde_json::Value;

/// Cache type every CLI command operates on
pub(crate) type CliCache = ExpiringCache<String, Value>;

/// Open the persistent cache selected by `store`
///
/// Entries carry their own deadline, so the TTL only matters for `set`.
pub(crate) fn open_cache(store: &StoreArgs, ttl: Ttl, config: &Config) -> CacheResult<CliCache> {
    let name = store.name.as_deref().unwrap_or_default();
    ExpiringCache::persistent(ttl, name, config)
}
