//! Run exclusivity: one workflow instance owns a tree at a time.
//!
//! An exclusive flock on a marker file under the state directory; fs2
//! releases the lock when the descriptor closes, so Drop is the unlock.
//! Acquisition is non-blocking — a second runner fails fast instead of
//! queueing behind a mutation in progress.

use crate::errors::SplitmapError;
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const LOCK_FILE_NAME: &str = "lock";

pub struct WorkspaceLock {
    _file: File, // held open to maintain the flock
    path: PathBuf,
}

impl WorkspaceLock {
    pub fn acquire(state_dir: &Path) -> Result<Self, SplitmapError> {
        fs::create_dir_all(state_dir)
            .map_err(|e| SplitmapError::io(state_dir, e))?;
        let path = state_dir.join(LOCK_FILE_NAME);
        let file = File::create(&path).map_err(|e| SplitmapError::io(&path, e))?;
        file.try_lock_exclusive()
            .map_err(|_| SplitmapError::Lock { path: path.clone() })?;
        log::debug!("acquired workspace lock at {}", path.display());
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_held() {
        let tmp = TempDir::new().unwrap();
        let guard = WorkspaceLock::acquire(tmp.path()).unwrap();
        assert!(guard.path().exists());

        let second = WorkspaceLock::acquire(tmp.path());
        assert!(matches!(second, Err(SplitmapError::Lock { .. })));
    }

    #[test]
    fn drop_releases_the_lock() {
        let tmp = TempDir::new().unwrap();
        {
            let _guard = WorkspaceLock::acquire(tmp.path()).unwrap();
        }
        let reacquired = WorkspaceLock::acquire(tmp.path());
        assert!(reacquired.is_ok());
    }
}
