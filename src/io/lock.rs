//! Write lock on the data directory.
//!
//! Every read-modify-write of the stored document (a CLI command, or one
//! change in the TUI) runs while holding `<data_dir>/.lock`, so two `tick`
//! processes never interleave their full-document saves.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Lock file name inside the data directory
pub const LOCK_FILE: &str = ".lock";

/// How long a writer waits for another process before giving up
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

const RETRY_EVERY: Duration = Duration::from_millis(10);

/// Held write lock. Released on drop.
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is held by another tick process (waited {waited:?})")]
    Busy { path: PathBuf, waited: Duration },
}

impl FileLock {
    /// Take the lock, retrying until `wait` has passed.
    /// Creates the data directory if it does not exist yet.
    pub fn acquire(data_dir: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = open_lock_file(data_dir, &path)?;

        let deadline = Instant::now() + wait;
        while !try_exclusive(&file) {
            if Instant::now() >= deadline {
                tracing::warn!(path = %path.display(), "data directory is locked");
                return Err(LockError::Busy { path, waited: wait });
            }
            thread::sleep(RETRY_EVERY);
        }
        tracing::trace!(path = %path.display(), "write lock taken");
        Ok(FileLock { _file: file, path })
    }

    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, DEFAULT_WAIT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // closing the file drops the flock
        let _ = fs::remove_file(&self.path);
    }
}

fn open_lock_file(data_dir: &Path, path: &Path) -> Result<File, LockError> {
    let open_error = |source| LockError::Open {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(data_dir).map_err(open_error)?;
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(open_error)
}

#[cfg(unix)]
fn try_exclusive(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    // SAFETY: the descriptor belongs to `file`, which outlives the call
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn try_exclusive(_file: &File) -> bool {
    true
}
