// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat storage: `heartbeats/<session-name>.json`, written by hook
//! scripts running inside the assistant process (spec §3, §4.5).

use fleet_core::Heartbeat;
use std::fs;

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::error::StoreError;
use crate::paths::FleetPaths;

/// Reads/writes the heartbeat file for a given tmux session name.
#[derive(Clone)]
pub struct HeartbeatStore {
    paths: FleetPaths,
}

impl HeartbeatStore {
    pub fn new(paths: FleetPaths) -> Self {
        Self { paths }
    }

    pub fn write(&self, session_name: &str, heartbeat: &Heartbeat) -> Result<(), StoreError> {
        write_json_atomic(&self.paths.heartbeat_path(session_name), heartbeat)
    }

    pub fn read(&self, session_name: &str) -> Option<Heartbeat> {
        read_json_opt(&self.paths.heartbeat_path(session_name))
    }

    /// Every heartbeat currently on disk, keyed by session name, for the
    /// Deacon's patrol sweep.
    pub fn list(&self) -> Result<Vec<(String, Heartbeat)>, StoreError> {
        let dir = self.paths.heartbeats_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(heartbeat) = read_json_opt(&path) {
                out.push((stem.to_string(), heartbeat));
            }
        }
        Ok(out)
    }
}
