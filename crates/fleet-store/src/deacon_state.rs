// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deacon persisted state: `deacon/health-state.json`, `deacon/config.json`
//! merged over defaults, and the append-only `deacon/health-history.jsonl`
//! (spec §3, §4.6, §6).

use fleet_core::{DeaconConfig, DeaconState};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;

use crate::atomic::{read_json_opt, write_json_atomic, FileLock};
use crate::error::StoreError;
use crate::paths::FleetPaths;

/// One row of `deacon/health-history.jsonl`, an optional append-only record
/// of patrol outcomes kept for offline inspection (spec §4.6 "may also
/// persist a health-history log").
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct HealthHistoryEntry {
    pub at_ms: i64,
    pub specialist_name: String,
    pub event: String,
}

/// Reads/writes the Deacon's own persisted state and config.
#[derive(Clone)]
pub struct DeaconStateStore {
    paths: FleetPaths,
}

impl DeaconStateStore {
    pub fn new(paths: FleetPaths) -> Self {
        Self { paths }
    }

    fn lock_path(&self) -> std::path::PathBuf {
        self.paths.deacon_dir().join(".health-state.lock")
    }

    pub fn read_state(&self) -> DeaconState {
        read_json_opt(&self.paths.deacon_health_state_path()).unwrap_or_default()
    }

    pub fn write_state(&self, state: &DeaconState) -> Result<(), StoreError> {
        fs::create_dir_all(self.paths.deacon_dir())?;
        write_json_atomic(&self.paths.deacon_health_state_path(), state)
    }

    /// Read-modify-write under a file lock, for patrol steps that mutate
    /// per-specialist counters from a single Deacon loop.
    pub fn update_state<F>(&self, f: F) -> Result<DeaconState, StoreError>
    where
        F: FnOnce(&mut DeaconState),
    {
        fs::create_dir_all(self.paths.deacon_dir())?;
        let _lock = FileLock::acquire(&self.lock_path())?;
        let mut state = self.read_state();
        f(&mut state);
        self.write_state(&state)?;
        Ok(state)
    }

    /// `deacon/config.json` deserialized with `DeaconConfig::default()` as
    /// the base (spec §6: "config merged over defaults" — an absent or
    /// partial file never fails startup).
    pub fn read_config(&self) -> DeaconConfig {
        let path = self.paths.deacon_config_path();
        match fs::read(&path) {
            Ok(data) => merge_config_json(&data),
            Err(_) => DeaconConfig::default(),
        }
    }

    pub fn write_config(&self, config: &DeaconConfig) -> Result<(), StoreError> {
        fs::create_dir_all(self.paths.deacon_dir())?;
        write_json_atomic(&self.paths.deacon_config_path(), config)
    }

    pub fn append_health_history(&self, entry: &HealthHistoryEntry) -> Result<(), StoreError> {
        let path = self.paths.deacon_health_history_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }
}

/// Deserializes a partial config object over `DeaconConfig::default()` so
/// an operator only needs to override the fields they care about.
fn merge_config_json(data: &[u8]) -> DeaconConfig {
    let default = serde_json::to_value(DeaconConfig::default()).unwrap_or(serde_json::Value::Null);
    let Ok(mut merged) = serde_json::from_slice::<serde_json::Value>(data) else {
        return DeaconConfig::default();
    };
    if let (serde_json::Value::Object(default_map), serde_json::Value::Object(override_map)) =
        (default, &merged)
    {
        let mut combined = default_map;
        for (k, v) in override_map {
            combined.insert(k.clone(), v.clone());
        }
        merged = serde_json::Value::Object(combined);
    }
    serde_json::from_value(merged).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::SpecialistRole;
    use tempfile::tempdir;

    #[test]
    fn read_state_on_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let store = DeaconStateStore::new(FleetPaths::new(dir.path()));
        let state = store.read_state();
        assert!(state.specialists.is_empty());
    }

    #[test]
    fn update_state_persists_across_instances() {
        let dir = tempdir().unwrap();
        let store = DeaconStateStore::new(FleetPaths::new(dir.path()));
        store
            .update_state(|s| {
                s.health_for(SpecialistRole::Review).consecutive_failures = 2;
            })
            .unwrap();
        let reloaded = DeaconStateStore::new(FleetPaths::new(dir.path())).read_state();
        assert_eq!(
            reloaded.specialists["review-agent"].consecutive_failures,
            2
        );
    }

    #[test]
    fn read_config_on_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let store = DeaconStateStore::new(FleetPaths::new(dir.path()));
        assert_eq!(store.read_config().ping_timeout_ms, 30_000);
    }

    #[test]
    fn read_config_merges_partial_override_over_defaults() {
        let dir = tempdir().unwrap();
        let store = DeaconStateStore::new(FleetPaths::new(dir.path()));
        fs::create_dir_all(dir.path().join("deacon")).unwrap();
        fs::write(
            dir.path().join("deacon/config.json"),
            br#"{"ping_timeout_ms": 5000}"#,
        )
        .unwrap();
        let config = store.read_config();
        assert_eq!(config.ping_timeout_ms, 5_000);
        assert_eq!(config.consecutive_failures, 3); // untouched default
    }

    #[test]
    fn health_history_appends_without_truncating() {
        let dir = tempdir().unwrap();
        let store = DeaconStateStore::new(FleetPaths::new(dir.path()));
        store
            .append_health_history(&HealthHistoryEntry {
                at_ms: 1,
                specialist_name: "review-agent".into(),
                event: "ping_ok".into(),
            })
            .unwrap();
        store
            .append_health_history(&HealthHistoryEntry {
                at_ms: 2,
                specialist_name: "review-agent".into(),
                event: "ping_ok".into(),
            })
            .unwrap();
        let content = fs::read_to_string(store.paths.deacon_health_history_path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
