//! In-process map backend

use super::MapStore;
use crate::error::CacheResult;
use std::collections::BTreeMap;

/// Plain in-memory map, private to one process
#[derive(Debug, Clone, Default)]
pub struct MemoryMap<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> MemoryMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for MemoryMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> MapStore<K, V> for MemoryMap<K, V> {
    fn get(&mut self, key: &K) -> CacheResult<Option<V>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: K, value: V) -> CacheResult<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn has(&mut self, key: &K) -> CacheResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn delete(&mut self, key: &K) -> CacheResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn clear(&mut self) -> CacheResult<()> {
        self.entries.clear();
        Ok(())
    }

    fn len(&mut self) -> CacheResult<usize> {
        Ok(self.entries.len())
    }

    fn entries(&mut self) -> CacheResult<Vec<(K, V)>> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&K, &V) -> bool) -> CacheResult<usize> {
        let before = self.entries.len();
        self.entries.retain(|k, v| keep(k, v));
        Ok(before - self.entries.len())
    }
}
