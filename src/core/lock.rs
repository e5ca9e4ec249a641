//! Cache root lock
//!
//! Provides an exclusive lock so two runs never touch the same cache root.
//! The lock is held on the file descriptor, so it ends with the owning
//! process and the file itself is left in place.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock file name inside the cache root
pub const LOCK_FILE_NAME: &str = ".qtprep.lock";

/// Acquire an exclusive lock on the cache root.
/// Returns a guard that releases the lock when dropped.
pub fn acquire_cache_lock(cache_root: &Path) -> Result<CacheLock> {
    let lock_path = cache_root.join(LOCK_FILE_NAME);

    // Never truncate or replace: another process may hold a lock on this inode.
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(anyhow::anyhow!(
            "Cache '{}' is in use by another qtprep process",
            cache_root.display()
        ));
    }

    Ok(CacheLock {
        file: lock_file,
        path: lock_path,
    })
}

/// RAII guard for the cache lock
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_lock_acquired_successfully() {
        let dir = TempDir::new().unwrap();
        let lock = acquire_cache_lock(dir.path()).unwrap();
        assert_eq!(lock.path(), dir.path().join(LOCK_FILE_NAME));
        assert!(lock.path().exists());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        {
            let _lock = acquire_cache_lock(dir.path()).unwrap();
            assert!(acquire_cache_lock(dir.path()).is_err());
        }
        assert!(acquire_cache_lock(dir.path()).is_ok());
    }

    #[test]
    fn test_concurrent_lock_blocked() {
        let dir = TempDir::new().unwrap();
        let _lock1 = acquire_cache_lock(dir.path()).unwrap();
        let lock2 = acquire_cache_lock(dir.path());
        assert!(lock2.is_err());
        assert!(lock2.unwrap_err().to_string().contains("in use"));
    }

    #[test]
    fn test_old_lock_file_still_blocks_while_held() {
        let dir = TempDir::new().unwrap();
        let _held = acquire_cache_lock(dir.path()).unwrap();

        let path = dir.path().join(LOCK_FILE_NAME);
        let three_hours_ago = SystemTime::now() - Duration::from_secs(3 * 3600);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(three_hours_ago)
            .unwrap();

        assert!(acquire_cache_lock(dir.path()).is_err());
        assert!(path.exists());
    }

    #[test]
    fn test_leftover_unlocked_file_is_reused() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LOCK_FILE_NAME), "").unwrap();
        assert!(acquire_cache_lock(dir.path()).is_ok());
    }
}
