//! Map-like storage backends
//!
//! [`MapStore`] is the seam between the expiring cache and its storage. Two
//! backends exist:
//!
//! | Backend | Scope | Notes |
//! |---------|-------|-------|
//! | [`MemoryMap`] | one process | never fails |
//! | [`PersistentMap`] | many processes | JSON file guarded by an [`ExpiringLock`](crate::lock::ExpiringLock) |
//!
//! Methods take `&mut self` because a persistent read refreshes its
//! in-memory mirror from disk first.

pub mod memory;
pub mod persistent;

pub use memory::MemoryMap;
pub use persistent::{purge, purge_at, storage_path, PersistentMap};

use crate::error::CacheResult;

/// Key-value storage used by [`ExpiringCache`](crate::cache::ExpiringCache)
pub trait MapStore<K, V> {
    /// Value stored under `key`
    fn get(&mut self, key: &K) -> CacheResult<Option<V>>;

    /// Insert or replace the value under `key`
    fn set(&mut self, key: K, value: V) -> CacheResult<()>;

    /// Whether `key` is present
    fn has(&mut self, key: &K) -> CacheResult<bool>;

    /// Remove `key`; returns whether it was present
    fn delete(&mut self, key: &K) -> CacheResult<bool>;

    /// Remove every entry
    fn clear(&mut self) -> CacheResult<()>;

    /// Number of entries
    fn len(&mut self) -> CacheResult<usize>;

    /// Snapshot of all entries, ordered by key
    fn entries(&mut self) -> CacheResult<Vec<(K, V)>>;

    /// Keep only the entries for which `keep` returns true; returns how many
    /// were removed
    fn retain(&mut self, keep: &mut dyn FnMut(&K, &V) -> bool) -> CacheResult<usize>;

    fn is_empty(&mut self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    fn keys(&mut self) -> CacheResult<Vec<K>> {
        Ok(self.entries()?.into_iter().map(|(k, _)| k).collect())
    }

    fn values(&mut self) -> CacheResult<Vec<V>> {
        Ok(self.entries()?.into_iter().map(|(_, v)| v).collect())
    }

    fn for_each(&mut self, f: &mut dyn FnMut(&K, &V)) -> CacheResult<()> {
        for (k, v) in self.entries()? {
            f(&k, &v);
        }
        Ok(())
    }
}
