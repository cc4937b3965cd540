//! expiring-cache - Cross-process expiring cache
//!
//! A TTL cache over either an in-memory map or a JSON file that several
//! processes share. File access is serialized by named advisory locks that
//! release themselves if a holder hangs.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod naming;
pub mod store;

pub use cache::{CacheEntry, CacheOptions, ExpiringCache, Expiry, Ttl};
pub use error::{CacheError, CacheResult};
pub use lock::{ExpiringLock, LockOptions};
pub use store::{MapStore, MemoryMap, PersistentMap};
