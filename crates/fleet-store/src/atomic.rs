// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Temp-file + rename atomic writes, grounded on the teacher's
//! `oj-storage::checkpoint` tmp-then-rename pattern, generalized from "one
//! big snapshot" to "one file per entity" (spec §3, §6: "all writes are
//! temp+rename").

use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::Path;

use crate::error::StoreError;

/// Pretty-prints `value` to JSON and atomically replaces `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp_path = tmp_path_for(path);
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp_path, &data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reads and parses `path` as JSON, returning `None` if it does not exist.
///
/// Per spec §7, a malformed file is treated as "missing" (logged, never
/// crashes the caller).
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let data = fs::read(path).ok()?;
    match serde_json::from_slice(&data) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed state file, treating as missing");
            None
        }
    }
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let file_name = path
        .file_name()
        .map(|n| format!(".{}.tmp", n.to_string_lossy()))
        .unwrap_or_else(|| ".tmp".to_string());
    path.with_file_name(file_name)
}

/// Holds an advisory exclusive file lock for the duration of a
/// read-modify-write, per spec §3 "Hook writers outside the agent append
/// atomically under a file lock on `hook.json`."
pub struct FileLock {
    _file: File,
}

impl FileLock {
    pub fn acquire(lock_path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = lock_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;
        file.lock_exclusive()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(Self { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_json_atomic(&path, &json!({"a": 1})).unwrap();
        let value: serde_json::Value = read_json_opt(&path).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn read_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(read_json_opt::<serde_json::Value>(&path).is_none());
    }

    #[test]
    fn read_malformed_file_is_none_not_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(read_json_opt::<serde_json::Value>(&path).is_none());
    }

    #[test]
    fn write_survives_restart_simulated_by_reopening() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hook.json");
        write_json_atomic(&path, &json!({"items": []})).unwrap();
        // Simulate "process kill and restart": tmp file must not linger.
        assert!(!tmp_path_for(&path).exists());
        let value: serde_json::Value = read_json_opt(&path).unwrap();
        assert_eq!(value["items"], serde_json::Value::Array(vec![]));
    }

    #[test]
    fn file_lock_can_be_reacquired_after_drop() {
        let dir = tempdir().unwrap();
        let lock_path = dir.path().join(".hook.lock");
        {
            let _lock = FileLock::acquire(&lock_path).unwrap();
        }
        let _lock2 = FileLock::acquire(&lock_path).unwrap();
    }
}
