//! Process-level registry locking
//!
//! Only one logwarden command may work on a registry at a time. The lock
//! is an exclusive advisory lock on a `<database>.lock` file next to the
//! registry, taken without blocking so a second invocation fails fast.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use crate::RegistryError;

/// Holds the exclusive registry lock until dropped
pub struct RegistryLock {
    _file: File,
    lock_path: PathBuf,
}

impl RegistryLock {
    /// Try to take the exclusive lock for the registry at `db_path`
    ///
    /// The parent directory is created if needed so the lock can be taken
    /// before the registry itself exists.
    ///
    /// # Errors
    ///
    /// `RegistryError::Locked` if another process holds the lock,
    /// `RegistryError::ConnectionFailed` if the lock file cannot be opened.
    pub fn acquire(db_path: &Path) -> Result<Self, RegistryError> {
        let lock_path = lock_path_for(db_path);

        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RegistryError::ConnectionFailed(format!(
                    "Failed to create lock directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                RegistryError::ConnectionFailed(format!(
                    "Failed to open lock file {}: {}",
                    lock_path.display(),
                    e
                ))
            })?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                info!(path = %lock_path.display(), "Acquired registry lock");
                Ok(Self {
                    _file: file,
                    lock_path,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!(path = %lock_path.display(), "Registry lock is held elsewhere");
                Err(RegistryError::Locked(lock_path.display().to_string()))
            }
            Err(e) => Err(RegistryError::ConnectionFailed(format!(
                "Failed to lock {}: {}",
                lock_path.display(),
                e
            ))),
        }
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        debug!(path = %self.lock_path.display(), "Releasing registry lock");
    }
}

impl std::fmt::Debug for RegistryLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLock")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

/// Lock file path for a registry path: the full file name plus `.lock`
///
/// `/var/lib/logwarden/devices.db` becomes `/var/lib/logwarden/devices.db.lock`.
pub fn lock_path_for(db_path: &Path) -> PathBuf {
    let mut name = db_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    db_path.with_file_name(name)
}
