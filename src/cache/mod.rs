//! Expiring cache
//!
//! Entries carry an absolute deadline and are dropped lazily when touched
//! after it. The cache sits on a [`MapStore`](crate::store::MapStore):
//!
//! | Backing | Store | Visibility |
//! |---------|-------|------------|
//! | in-memory | `MemoryMap` | this process |
//! | persistent | `PersistentMap` | every process sharing the storage directory |
//!
//! Deadlines are wall-clock epoch milliseconds so peers on one host agree on
//! them.

pub mod entry;
pub mod expiring;

pub use entry::{CacheEntry, Expiry, Ttl};
pub use expiring::{CacheOptions, ExpiringCache};
