// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance advisory lock for the daemon process, grounded on the
//! teacher daemon's pid-lock-file startup step.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another fleetd is already running (lock held at {0})")]
    AlreadyRunning(PathBuf),
    #[error("failed to open lock file {0}: {1}")]
    Open(PathBuf, #[source] std::io::Error),
    #[error("failed to write pid to lock file {0}: {1}")]
    WritePid(PathBuf, #[source] std::io::Error),
}

/// Holds an exclusive lock on `fleetd.pid` for the lifetime of the daemon
/// process. Dropping it releases the lock.
pub struct DaemonLock {
    _file: File,
    path: PathBuf,
}

impl DaemonLock {
    /// Acquires the lock or returns `AlreadyRunning` if another process
    /// holds it. Uses `OpenOptions` without truncation so a failed
    /// acquisition never wipes the running daemon's pid.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| LockError::Open(path.to_path_buf(), e))?;

        file.try_lock_exclusive()
            .map_err(|_| LockError::AlreadyRunning(path.to_path_buf()))?;

        let mut file = file;
        file.set_len(0).map_err(|e| LockError::WritePid(path.to_path_buf(), e))?;
        writeln!(file, "{}", std::process::id())
            .map_err(|e| LockError::WritePid(path.to_path_buf(), e))?;

        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
