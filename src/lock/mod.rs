//! Named cross-process locks with bounded wait and bounded hold
//!
//! An [`ExpiringLock`] is an exclusive advisory lock on
//! `<dir>/<sanitized name>.lock`. Acquisition polls a non-blocking file
//! lock until the wait budget runs out. Once held, a helper thread releases the
//! lock after the hold duration unless [`ExpiringLock::unlock`] gets there
//! first, so a hung holder cannot starve its peers forever.
//!
//! Mutual exclusion holds between processes and between separate
//! `ExpiringLock` values inside one process, as long as the lock directory
//! lives on a filesystem that honors advisory locks.

mod file_lock;

use crate::error::{CacheError, CacheResult};
use crate::naming;
use file_lock::Attempt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default maximum hold time in milliseconds
pub const DEFAULT_HOLD_MS: u64 = 10_000;

/// Default maximum wait time in milliseconds
pub const DEFAULT_WAIT_MS: u64 = 10_000;

/// Upper bound on the sleep between two acquisition attempts
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Timing and placement of a lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOptions {
    /// Maximum time the lock is held before it is released automatically
    pub hold: Duration,

    /// Maximum time `acquire` blocks before giving up
    pub wait: Duration,

    /// Directory holding the lock files
    pub dir: PathBuf,
}

impl LockOptions {
    /// Create lock options
    pub fn new(hold: Duration, wait: Duration, dir: impl Into<PathBuf>) -> Self {
        Self {
            hold,
            wait,
            dir: dir.into(),
        }
    }

    /// Lock file used for `lock_id`
    pub fn lock_path(&self, lock_id: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", naming::sanitize(lock_id)))
    }
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(DEFAULT_HOLD_MS),
            wait: Duration::from_millis(DEFAULT_WAIT_MS),
            dir: std::env::temp_dir(),
        }
    }
}

type Slot = Arc<Mutex<Option<File>>>;

struct AutoRelease {
    cancel: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// An acquired lock; released by [`unlock`](Self::unlock), on drop, or
/// when the hold duration elapses
pub struct ExpiringLock {
    name: String,
    path: PathBuf,
    slot: Slot,
    timer: Option<AutoRelease>,
}

impl ExpiringLock {
    /// Acquire the lock named `lock_id`, blocking for at most `options.wait`
    pub fn acquire(lock_id: &str, options: &LockOptions) -> CacheResult<Self> {
        let path = options.lock_path(lock_id);

        fs::create_dir_all(&options.dir).map_err(|e| {
            CacheError::io(format!("creating lock directory {}", options.dir.display()), e)
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| CacheError::io(format!("opening lock file {}", path.display()), e))?;

        let started = Instant::now();
        loop {
            match file_lock::try_lock_exclusive(&file) {
                Ok(Attempt::Acquired) => break,
                Ok(Attempt::Busy) => {}
                Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                    return Err(CacheError::LockUnsupported(std::env::consts::OS.to_string()));
                }
                Err(e) => {
                    return Err(CacheError::io(format!("locking {}", path.display()), e));
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= options.wait {
                debug!(lock = lock_id, "Gave up waiting for lock");
                return Err(CacheError::lock_timeout(lock_id, options.wait));
            }
            thread::sleep(RETRY_INTERVAL.min(options.wait - elapsed));
        }

        debug!(
            lock = lock_id,
            waited_ms = started.elapsed().as_millis() as u64,
            "Acquired lock"
        );

        let slot: Slot = Arc::new(Mutex::new(Some(file)));
        let timer = match arm_auto_release(lock_id, options.hold, Arc::clone(&slot)) {
            Ok(timer) => timer,
            Err(e) => {
                release(&slot);
                return Err(CacheError::io("spawning lock auto-release timer", e));
            }
        };

        Ok(Self {
            name: lock_id.to_string(),
            path,
            slot,
            timer: Some(timer),
        })
    }

    /// Name the lock was requested under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle still holds the lock
    pub fn is_held(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Release the lock and disarm the auto-release timer
    ///
    /// Safe to call more than once, and after the timer already fired.
    pub fn unlock(&mut self) {
        let released = release(&self.slot);

        let Some(timer) = self.timer.take() else {
            return;
        };
        let _ = timer.cancel.send(());
        let _ = timer.handle.join();

        if released {
            debug!(lock = %self.name, "Released lock");
        } else {
            warn!(
                lock = %self.name,
                "Lock was auto-released before unlock; the critical section outlived its hold duration"
            );
        }
    }
}

impl Drop for ExpiringLock {
    fn drop(&mut self) {
        self.unlock();
    }
}

impl std::fmt::Debug for ExpiringLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringLock")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("held", &self.is_held())
            .finish()
    }
}

/// Unlock and close the file if it is still held; returns whether it was
fn release(slot: &Mutex<Option<File>>) -> bool {
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    match guard.take() {
        Some(file) => {
            let _ = file_lock::unlock(&file);
            true
        }
        None => false,
    }
}

fn arm_auto_release(name: &str, hold: Duration, slot: Slot) -> io::Result<AutoRelease> {
    let (cancel, cancelled) = mpsc::channel::<()>();
    let lock_name = name.to_string();

    let handle = thread::Builder::new()
        .name("lock-auto-release".to_string())
        .spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(hold) {
                if release(&slot) {
                    warn!(
                        lock = %lock_name,
                        hold_ms = hold.as_millis() as u64,
                        "Hold duration elapsed, auto-releasing lock"
                    );
                }
            }
        })?;

    Ok(AutoRelease { cancel, handle })
}
