//! File-backed map shared between processes
//!
//! Each map owns `<storage dir>/<sanitized name>.json`, a JSON array of
//! `[key, value]` pairs. The in-memory mirror is refreshed from that file
//! before every operation, with disk values winning for keys present on
//! both sides. Mutations hold one [`ExpiringLock`] across the refresh, the
//! change, and the write back, so a peer cannot interleave between them.
//!
//! Keys that are only in memory survive a refresh. A key deleted by a peer
//! therefore stays visible here and is written back by this instance's next
//! mutation.

use super::MapStore;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::lock::{ExpiringLock, LockOptions};
use crate::naming;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Path of the backing file for map `name` under `dir`
pub fn storage_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", naming::sanitize(name)))
}

/// Remove the backing file of map `name`; returns whether it existed
pub fn purge(name: &str, config: &Config) -> CacheResult<bool> {
    purge_at(name, &config.storage.dir, &config.lock.options())
}

/// Like [`purge`] with an explicit storage directory and lock options
pub fn purge_at(name: &str, dir: &Path, lock: &LockOptions) -> CacheResult<bool> {
    let path = storage_path(dir, validate_name(name)?);
    let mut guard = ExpiringLock::acquire(&lock_id(&path), lock)?;

    let existed = match fs::remove_file(&path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            return Err(CacheError::io(
                format!("removing map file {}", path.display()),
                e,
            ))
        }
    };
    guard.unlock();

    debug!(map = name, existed, "Purged map storage");
    Ok(existed)
}

fn validate_name(name: &str) -> CacheResult<&str> {
    if name.trim().is_empty() {
        return Err(CacheError::InvalidStorageName(name.to_string()));
    }
    Ok(name)
}

fn lock_id(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Key-value map mirrored to a JSON file
#[derive(Debug)]
pub struct PersistentMap<K, V> {
    name: String,
    path: PathBuf,
    lock_id: String,
    lock: LockOptions,
    mirror: BTreeMap<K, V>,
}

impl<K, V> PersistentMap<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Open map `name` in the configured storage directory
    ///
    /// Nothing touches the disk until the first operation.
    pub fn open(name: &str, config: &Config) -> CacheResult<Self> {
        Self::open_at(name, &config.storage.dir, config.lock.options())
    }

    /// Open map `name` in `dir`, guarded by locks built from `lock`
    pub fn open_at(name: &str, dir: &Path, lock: LockOptions) -> CacheResult<Self> {
        let path = storage_path(dir, validate_name(name)?);
        Ok(Self {
            name: name.to_string(),
            lock_id: lock_id(&path),
            path,
            lock,
            mirror: BTreeMap::new(),
        })
    }

    /// Open map `name` and immediately write `seed` into it
    pub fn with_entries(
        name: &str,
        seed: impl IntoIterator<Item = (K, V)>,
        config: &Config,
    ) -> CacheResult<Self> {
        let mut map = Self::open(name, config)?;
        map.mutate(|mirror| mirror.extend(seed))?;
        Ok(map)
    }

    /// Logical map name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the lock guarding the backing file
    pub fn lock_id(&self) -> &str {
        &self.lock_id
    }

    /// Refresh before a read. Lock or read failures leave the mirror as is.
    fn refresh(&mut self) {
        match ExpiringLock::acquire(&self.lock_id, &self.lock) {
            Ok(mut guard) => {
                self.merge_from_disk();
                guard.unlock();
            }
            Err(e) => {
                debug!(map = %self.name, error = %e, "Skipping resync, serving in-memory state");
            }
        }
    }

    /// Run `op` between a refresh and a flush, all under one lock
    ///
    /// If the flush fails the mirror is put back as it was before `op`.
    fn mutate<R>(&mut self, op: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> CacheResult<R> {
        let mut guard = ExpiringLock::acquire(&self.lock_id, &self.lock)?;
        self.merge_from_disk();

        let previous = self.mirror.clone();
        let result = op(&mut self.mirror);
        self.flush_or_restore(previous)?;

        guard.unlock();
        Ok(result)
    }

    fn flush_or_restore(&mut self, previous: BTreeMap<K, V>) -> CacheResult<()> {
        if let Err(e) = self.write_to_disk() {
            debug!(map = %self.name, error = %e, "Flush failed, discarding change");
            self.mirror = previous;
            return Err(e);
        }
        Ok(())
    }

    fn merge_from_disk(&mut self) {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Failed to read map file");
                return;
            }
        };

        match serde_json::from_str::<Vec<(K, V)>>(&content) {
            Ok(pairs) => self.mirror.extend(pairs),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Ignoring unparsable map file");
            }
        }
    }

    /// Replace the backing file with the mirror via a temp file + rename
    fn write_to_disk(&self) -> CacheResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CacheError::io(format!("creating storage directory {}", parent.display()), e)
            })?;
        }

        let pairs: Vec<(&K, &V)> = self.mirror.iter().collect();
        let content = serde_json::to_string(&pairs)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "map.json".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{file_name}.tmp.{}", Uuid::new_v4()));

        fs::write(&temp_path, content).map_err(|e| {
            CacheError::io(format!("writing map file {}", temp_path.display()), e)
        })?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(
                format!("replacing map file {}", self.path.display()),
                e,
            ));
        }

        debug!(map = %self.name, entries = self.mirror.len(), "Flushed map");
        Ok(())
    }
}

impl<K, V> MapStore<K, V> for PersistentMap<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    fn get(&mut self, key: &K) -> CacheResult<Option<V>> {
        self.refresh();
        Ok(self.mirror.get(key).cloned())
    }

    fn set(&mut self, key: K, value: V) -> CacheResult<()> {
        self.mutate(|mirror| {
            mirror.insert(key, value);
        })
    }

    fn has(&mut self, key: &K) -> CacheResult<bool> {
        self.refresh();
        Ok(self.mirror.contains_key(key))
    }

    fn delete(&mut self, key: &K) -> CacheResult<bool> {
        self.mutate(|mirror| mirror.remove(key).is_some())
    }

    fn clear(&mut self) -> CacheResult<()> {
        self.mutate(|mirror| mirror.clear())
    }

    fn len(&mut self) -> CacheResult<usize> {
        self.refresh();
        Ok(self.mirror.len())
    }

    fn entries(&mut self) -> CacheResult<Vec<(K, V)>> {
        self.refresh();
        Ok(self
            .mirror
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn for_each(&mut self, f: &mut dyn FnMut(&K, &V)) -> CacheResult<()> {
        self.refresh();
        for (k, v) in &self.mirror {
            f(k, v);
        }
        Ok(())
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&K, &V) -> bool) -> CacheResult<usize> {
        let mut guard = ExpiringLock::acquire(&self.lock_id, &self.lock)?;
        self.merge_from_disk();

        let previous = self.mirror.clone();
        self.mirror.retain(|k, v| keep(k, v));
        let removed = previous.len() - self.mirror.len();

        if removed > 0 {
            self.flush_or_restore(previous)?;
        }
        guard.unlock();
        Ok(removed)
    }
}
