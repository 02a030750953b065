// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Store (spec §4.2): the durable per-agent directory holding
//! `state.json`, `runtime.json`, `health.json`, `hook.json`, `mail/`,
//! `handoffs/`, `approved`.

use fleet_core::{AgentId, AgentRuntimeState, AgentSpec};
use std::fs;

use crate::error::StoreError;
use crate::paths::FleetPaths;

/// Owns the `<root>/agents/<id>/` directory tree.
///
/// Per spec §3 "Ownership": this struct is the only writer of `state.json`;
/// the Deacon may only read it and may only write `runtime.json`/
/// `health.json`.
#[derive(Clone)]
pub struct AgentStore {
    paths: FleetPaths,
}

impl AgentStore {
    pub fn new(paths: FleetPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &FleetPaths {
        &self.paths
    }

    /// Creates `agents/<id>/`, `mail/`, and `handoffs/` idempotently.
    pub fn init_agent_dir(&self, id: &AgentId) -> Result<(), StoreError> {
        fs::create_dir_all(self.paths.agent_dir(id.as_str()))?;
        fs::create_dir_all(self.paths.mail_dir(id.as_str()))?;
        fs::create_dir_all(self.paths.handoffs_dir(id.as_str()))?;
        Ok(())
    }

    pub fn write_state(&self, spec: &AgentSpec) -> Result<(), StoreError> {
        crate::atomic::write_json_atomic(&self.paths.state_path(spec.id.as_str()), spec)
    }

    pub fn read_state(&self, id: &AgentId) -> Option<AgentSpec> {
        crate::atomic::read_json_opt(&self.paths.state_path(id.as_str()))
    }

    pub fn require_state(&self, id: &AgentId) -> Result<AgentSpec, StoreError> {
        self.read_state(id)
            .ok_or_else(|| StoreError::NoSuchAgent(id.as_str().to_string()))
    }

    /// Written by the assistant's hook scripts; read by the Deacon and
    /// Supervisor (spec §3 `AgentRuntimeState`).
    pub fn write_runtime(&self, id: &AgentId, runtime: &AgentRuntimeState) -> Result<(), StoreError> {
        crate::atomic::write_json_atomic(&self.paths.runtime_path(id.as_str()), runtime)
    }

    pub fn read_runtime(&self, id: &AgentId) -> Option<AgentRuntimeState> {
        crate::atomic::read_json_opt(&self.paths.runtime_path(id.as_str()))
    }

    pub fn write_health(&self, id: &AgentId, health: &serde_json::Value) -> Result<(), StoreError> {
        crate::atomic::write_json_atomic(&self.paths.health_path(id.as_str()), health)
    }

    pub fn read_health(&self, id: &AgentId) -> Option<serde_json::Value> {
        crate::atomic::read_json_opt(&self.paths.health_path(id.as_str()))
    }

    /// Marker written on approval (spec §6 `agents/<id>/approved`).
    pub fn mark_approved(&self, id: &AgentId) -> Result<(), StoreError> {
        fs::write(self.paths.approved_path(id.as_str()), b"")?;
        Ok(())
    }

    pub fn is_approved(&self, id: &AgentId) -> bool {
        self.paths.approved_path(id.as_str()).exists()
    }

    /// All agent ids currently present in the store (live or stopped).
    pub fn list_agent_ids(&self) -> Result<Vec<AgentId>, StoreError> {
        let dir = self.paths.agents_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(AgentId::new(name));
                }
            }
        }
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }

    /// Explicit tear-down: removes the entire agent directory. Per spec §3,
    /// this is the *only* way an agent's directory is destroyed.
    pub fn tear_down(&self, id: &AgentId) -> Result<(), StoreError> {
        let dir = self.paths.agent_dir(id.as_str());
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
