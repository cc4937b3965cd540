//! TTL cache over a [`MapStore`]

use super::entry::{CacheEntry, Expiry, Ttl};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::store::{MapStore, MemoryMap, PersistentMap};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// How to build an [`ExpiringCache`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Lifetime of entries written with `set`
    pub ttl: Ttl,

    /// Share entries with other processes through a [`PersistentMap`]
    pub persistent: bool,

    /// Map name, required when `persistent` is set
    pub storage_name: Option<String>,
}

impl CacheOptions {
    pub fn in_memory(ttl: Ttl) -> Self {
        Self {
            ttl,
            persistent: false,
            storage_name: None,
        }
    }

    pub fn persistent(ttl: Ttl, storage_name: impl Into<String>) -> Self {
        Self {
            ttl,
            persistent: true,
            storage_name: Some(storage_name.into()),
        }
    }
}

/// Map whose entries disappear once their TTL has passed
///
/// Expired entries are removed when they are next touched by `get`, `has`
/// or iteration; nothing runs in the background.
pub struct ExpiringCache<K, V> {
    ttl: Ttl,
    store: Box<dyn MapStore<K, CacheEntry<V>>>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned + 'static,
    V: Clone + Serialize + DeserializeOwned + 'static,
{
    /// Build a cache from `options`; persistent caches resolve their
    /// storage and lock settings from `config`
    pub fn open(options: CacheOptions, config: &Config) -> CacheResult<Self> {
        if !options.persistent {
            return Ok(Self::in_memory(options.ttl));
        }

        let name = options
            .storage_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or(CacheError::MissingStorageName)?;

        let map: PersistentMap<K, CacheEntry<V>> = PersistentMap::open(name, config)?;
        debug!(map = name, path = %map.path().display(), "Opened persistent cache");
        Ok(Self::with_store(options.ttl, Box::new(map)))
    }

    /// Cache private to this process
    pub fn in_memory(ttl: Ttl) -> Self {
        Self::with_store(ttl, Box::new(MemoryMap::<K, CacheEntry<V>>::new()))
    }

    /// Cache shared through the map file named `storage_name`
    pub fn persistent(ttl: Ttl, storage_name: &str, config: &Config) -> CacheResult<Self> {
        Self::open(CacheOptions::persistent(ttl, storage_name), config)
    }
}

impl<K, V> ExpiringCache<K, V>
where
    K: Clone + PartialEq,
    V: Clone,
{
    /// Cache over any store
    pub fn with_store(ttl: Ttl, store: Box<dyn MapStore<K, CacheEntry<V>>>) -> Self {
        Self { ttl, store }
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Store `value` for the cache's TTL
    pub fn set(&mut self, key: K, value: V) -> CacheResult<()> {
        self.set_with_ttl(key, value, self.ttl)
    }

    /// Store `value` for `ttl` instead of the cache's TTL
    pub fn set_with_ttl(&mut self, key: K, value: V, ttl: Ttl) -> CacheResult<()> {
        self.store.set(key, CacheEntry::new(value, ttl, Utc::now()))
    }

    /// Value under `key` if present and not expired
    pub fn get(&mut self, key: &K) -> CacheResult<Option<V>> {
        let Some(entry) = self.store.get(key)? else {
            return Ok(None);
        };

        if entry.is_valid_at(Utc::now()) {
            return Ok(Some(entry.value));
        }

        // Re-checked under the lock so a fresh value written by a peer survives.
        let now = Utc::now();
        self.evict(&mut |k, entry| k != key || entry.is_valid_at(now))?;
        Ok(None)
    }

    /// Whether `key` holds a live entry
    pub fn has(&mut self, key: &K) -> CacheResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Deadline of the entry under `key`, `None` if absent
    ///
    /// Expired entries are reported, not evicted.
    pub fn expires(&mut self, key: &K) -> CacheResult<Option<Expiry>> {
        Ok(self.store.get(key)?.map(|entry| entry.expiry()))
    }

    /// Remove `key`; returns whether it was present
    pub fn delete(&mut self, key: &K) -> CacheResult<bool> {
        self.store.delete(key)
    }

    pub fn clear(&mut self) -> CacheResult<()> {
        self.store.clear()
    }

    /// Live entries with their deadlines, ordered by key, evicting expired
    /// ones on the way
    pub fn snapshot(&mut self) -> CacheResult<Vec<(K, CacheEntry<V>)>> {
        let now = Utc::now();
        let (live, expired): (Vec<_>, Vec<_>) = self
            .store
            .entries()?
            .into_iter()
            .partition(|(_, entry)| entry.is_valid_at(now));

        if !expired.is_empty() {
            self.evict(&mut |_, entry| entry.is_valid_at(now))?;
        }
        Ok(live)
    }

    /// Live entries, ordered by key
    pub fn entries(&mut self) -> CacheResult<Vec<(K, V)>> {
        Ok(self
            .snapshot()?
            .into_iter()
            .map(|(k, entry)| (k, entry.value))
            .collect())
    }

    pub fn keys(&mut self) -> CacheResult<Vec<K>> {
        Ok(self.entries()?.into_iter().map(|(k, _)| k).collect())
    }

    pub fn values(&mut self) -> CacheResult<Vec<V>> {
        Ok(self.entries()?.into_iter().map(|(_, v)| v).collect())
    }

    pub fn for_each(&mut self, mut f: impl FnMut(&K, &V)) -> CacheResult<()> {
        for (k, v) in self.entries()? {
            f(&k, &v);
        }
        Ok(())
    }

    /// Number of live entries
    pub fn len(&mut self) -> CacheResult<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&mut self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Evict every expired entry now; returns how many were removed
    pub fn prune(&mut self) -> CacheResult<usize> {
        let now = Utc::now();
        let evicted = self.store.retain(&mut |_, entry| entry.is_valid_at(now))?;
        debug!(evicted, "Pruned expired entries");
        Ok(evicted)
    }

    /// Drop entries rejected by `keep`; a busy lock defers the eviction to
    /// a later access instead of failing the read
    fn evict(&mut self, keep: &mut dyn FnMut(&K, &CacheEntry<V>) -> bool) -> CacheResult<()> {
        match self.store.retain(keep) {
            Ok(0) => {}
            Ok(evicted) => debug!(evicted, "Evicted expired entries"),
            Err(e) if e.is_retryable() => {
                debug!(error = %e, "Lock busy, leaving expired entries for later");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

impl<K, V> fmt::Debug for ExpiringCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::ExpiringLock;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_config(temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.dir = temp.path().join("storage");
        config.lock.dir = Some(temp.path().join("locks"));
        config
    }

    fn ms(ms: u64) -> Ttl {
        Ttl::Finite(Duration::from_millis(ms))
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn set_then_get() {
        let mut cache = ExpiringCache::in_memory(ms(60_000));
        cache.set(s("k"), 42).unwrap();

        assert_eq!(cache.get(&s("k")).unwrap(), Some(42));
        assert!(cache.has(&s("k")).unwrap());
        assert_eq!(cache.get(&s("missing")).unwrap(), None);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = ExpiringCache::in_memory(ms(20));
        cache.set(s("k"), s("v")).unwrap();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(cache.get(&s("k")).unwrap(), None);
        assert!(!cache.has(&s("k")).unwrap());
        assert_eq!(cache.expires(&s("k")).unwrap(), None);
    }

    #[test]
    fn infinite_ttl_never_expires() {
        let mut cache = ExpiringCache::in_memory(Ttl::Infinite);
        cache.set(s("k"), s("v")).unwrap();
        thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.expires(&s("k")).unwrap(), Some(Expiry::Never));
        assert_eq!(cache.get(&s("k")).unwrap(), Some(s("v")));
    }

    #[test]
    fn expires_reports_without_evicting() {
        let mut cache = ExpiringCache::in_memory(ms(10));
        let before = Utc::now();
        cache.set(s("k"), 1).unwrap();
        thread::sleep(Duration::from_millis(30));

        match cache.expires(&s("k")).unwrap() {
            Some(Expiry::At(at)) => assert!(at >= before),
            other => panic!("expected a deadline, got {other:?}"),
        }
        // Still there until touched by get.
        assert!(cache.expires(&s("k")).unwrap().is_some());
        assert!(!cache.has(&s("k")).unwrap());
        assert!(cache.expires(&s("k")).unwrap().is_none());
    }

    #[test]
    fn iteration_skips_and_evicts_expired() {
        let mut cache = ExpiringCache::in_memory(Ttl::Infinite);
        cache.set(s("live"), 1).unwrap();
        cache.set_with_ttl(s("stale"), 2, ms(10)).unwrap();
        thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.keys().unwrap(), vec![s("live")]);
        assert_eq!(cache.len().unwrap(), 1);
        assert_eq!(cache.expires(&s("stale")).unwrap(), None);

        let mut seen = Vec::new();
        cache.for_each(|k, v| seen.push((k.clone(), *v))).unwrap();
        assert_eq!(seen, vec![(s("live"), 1)]);
    }

    #[test]
    fn prune_counts_evictions() {
        let mut cache = ExpiringCache::in_memory(ms(10));
        cache.set(s("a"), 1).unwrap();
        cache.set(s("b"), 2).unwrap();
        cache.set_with_ttl(s("c"), 3, Ttl::Infinite).unwrap();
        thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.prune().unwrap(), 2);
        assert_eq!(cache.values().unwrap(), vec![3]);
    }

    #[test]
    fn persistent_requires_storage_name() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);

        let missing = CacheOptions {
            ttl: Ttl::Infinite,
            persistent: true,
            storage_name: None,
        };
        let err = ExpiringCache::<String, String>::open(missing, &config).unwrap_err();
        assert!(matches!(err, CacheError::MissingStorageName));

        let blank = CacheOptions::persistent(Ttl::Infinite, " ");
        let err = ExpiringCache::<String, String>::open(blank, &config).unwrap_err();
        assert!(matches!(err, CacheError::MissingStorageName));
    }

    #[test]
    fn in_memory_ignores_storage_name() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);

        let mut cache =
            ExpiringCache::<String, u8>::open(CacheOptions::in_memory(Ttl::Infinite), &config)
                .unwrap();
        cache.set(s("k"), 1).unwrap();
        assert!(!config.storage.dir.exists());
    }

    #[test]
    fn persistent_caches_share_by_name() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);

        let mut a = ExpiringCache::persistent(ms(60_000), "plugins", &config).unwrap();
        let mut b = ExpiringCache::<String, String>::persistent(ms(60_000), "plugins", &config)
            .unwrap();
        let mut other =
            ExpiringCache::<String, String>::persistent(ms(60_000), "options", &config).unwrap();

        a.set(s("k"), s("v")).unwrap();

        assert_eq!(b.get(&s("k")).unwrap(), Some(s("v")));
        assert_eq!(other.get(&s("k")).unwrap(), None);
    }

    #[test]
    fn persistent_expiry_evicts_from_disk() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);

        let mut cache = ExpiringCache::persistent(ms(10), "results", &config).unwrap();
        cache.set(s("k"), s("v")).unwrap();
        thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.get(&s("k")).unwrap(), None);

        let mut raw: PersistentMap<String, CacheEntry<String>> =
            PersistentMap::open("results", &config).unwrap();
        assert!(!raw.has(&s("k")).unwrap());
    }

    #[test]
    fn reads_succeed_while_peer_holds_the_lock() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(&temp);
        config.lock.wait_ms = 50;

        let mut cache = ExpiringCache::persistent(Ttl::Infinite, "results", &config).unwrap();
        cache.set(s("live"), s("v")).unwrap();
        cache.set_with_ttl(s("stale"), s("old"), ms(10)).unwrap();
        thread::sleep(Duration::from_millis(30));

        let map: PersistentMap<String, CacheEntry<String>> =
            PersistentMap::open("results", &config).unwrap();
        let held = ExpiringLock::acquire(map.lock_id(), &config.lock.options()).unwrap();

        assert_eq!(cache.get(&s("live")).unwrap(), Some(s("v")));
        assert_eq!(cache.get(&s("stale")).unwrap(), None);
        assert!(!cache.has(&s("stale")).unwrap());
        assert_eq!(cache.len().unwrap(), 1);
        assert_eq!(cache.keys().unwrap(), vec![s("live")]);

        // Eviction was deferred; it happens once the lock is free again.
        drop(held);
        assert_eq!(cache.prune().unwrap(), 1);
    }

    #[test]
    fn peer_rewrite_replaces_stale_local_entry() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);

        let mut stale = ExpiringCache::persistent(ms(10), "results", &config).unwrap();
        stale.set(s("k"), s("old")).unwrap();
        thread::sleep(Duration::from_millis(30));

        // A peer rewrote the key before this instance evicted it.
        let mut peer = ExpiringCache::persistent(ms(60_000), "results", &config).unwrap();
        peer.set(s("k"), s("new")).unwrap();

        assert_eq!(stale.get(&s("k")).unwrap(), Some(s("new")));
    }
}
