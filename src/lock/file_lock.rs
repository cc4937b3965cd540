//! Non-blocking exclusive file locks
//!
//! `flock` on Unix, `LockFileEx` on Windows, both through [`fs4`].

use fs4::fs_std::FileExt;
use std::fs::File;
use std::io;

/// Outcome of a single lock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attempt {
    Acquired,
    Busy,
}

pub(crate) fn try_lock_exclusive(file: &File) -> io::Result<Attempt> {
    // Qualified so newer toolchains do not pick `File::try_lock_exclusive`.
    match FileExt::try_lock_exclusive(file) {
        Ok(true) => Ok(Attempt::Acquired),
        Ok(false) => Ok(Attempt::Busy),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Attempt::Busy),
        Err(e) => Err(e),
    }
}

pub(crate) fn unlock(file: &File) -> io::Result<()> {
    FileExt::unlock(file)
}
