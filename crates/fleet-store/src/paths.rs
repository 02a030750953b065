// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane root directory resolution and path layout (spec §6
//! "Filesystem layout"), grounded on the teacher's per-crate `env.rs`
//! modules.

use std::path::{Path, PathBuf};

/// Environment variable overriding the control-plane root directory.
pub const ROOT_ENV_VAR: &str = "FLEET_HOME";

/// Path layout rooted at a single control-plane directory.
#[derive(Debug, Clone)]
pub struct FleetPaths {
    root: PathBuf,
}

impl FleetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the root from `FLEET_HOME`, falling back to
    /// `~/.fleet` (or `./.fleet` if the home directory is unknown).
    pub fn from_env() -> Self {
        if let Ok(root) = std::env::var(ROOT_ENV_VAR) {
            return Self::new(root);
        }
        let fallback = std::env::var("HOME")
            .map(|home| Path::new(&home).join(".fleet"))
            .unwrap_or_else(|_| PathBuf::from(".fleet"));
        Self::new(fallback)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    pub fn agent_dir(&self, id: &str) -> PathBuf {
        self.agents_dir().join(id)
    }

    pub fn state_path(&self, id: &str) -> PathBuf {
        self.agent_dir(id).join("state.json")
    }

    pub fn runtime_path(&self, id: &str) -> PathBuf {
        self.agent_dir(id).join("runtime.json")
    }

    pub fn health_path(&self, id: &str) -> PathBuf {
        self.agent_dir(id).join("health.json")
    }

    pub fn hook_path(&self, id: &str) -> PathBuf {
        self.agent_dir(id).join("hook.json")
    }

    pub fn hook_lock_path(&self, id: &str) -> PathBuf {
        self.agent_dir(id).join(".hook.lock")
    }

    pub fn mail_dir(&self, id: &str) -> PathBuf {
        self.agent_dir(id).join("mail")
    }

    pub fn handoffs_dir(&self, id: &str) -> PathBuf {
        self.agent_dir(id).join("handoffs")
    }

    pub fn approved_path(&self, id: &str) -> PathBuf {
        self.agent_dir(id).join("approved")
    }

    pub fn heartbeats_dir(&self) -> PathBuf {
        self.root.join("heartbeats")
    }

    pub fn heartbeat_path(&self, session_name: &str) -> PathBuf {
        self.heartbeats_dir().join(format!("{}.json", session_name))
    }

    pub fn specialists_dir(&self) -> PathBuf {
        self.root.join("specialists")
    }

    pub fn specialist_dir(&self, role: &str) -> PathBuf {
        self.specialists_dir().join(role)
    }

    pub fn specialist_session_id_path(&self, role: &str) -> PathBuf {
        self.specialist_dir(role).join("session-id.txt")
    }

    pub fn specialist_queue_path(&self, role: &str) -> PathBuf {
        self.specialist_dir(role).join("queue.jsonl")
    }

    pub fn specialist_wake_log_path(&self, role: &str) -> PathBuf {
        self.specialist_dir(role).join("wake-log.jsonl")
    }

    pub fn specialist_history_path(&self, role: &str) -> PathBuf {
        self.specialist_dir(role).join("history.jsonl")
    }

    pub fn deacon_dir(&self) -> PathBuf {
        self.root.join("deacon")
    }

    pub fn deacon_health_state_path(&self) -> PathBuf {
        self.deacon_dir().join("health-state.json")
    }

    pub fn deacon_config_path(&self) -> PathBuf {
        self.deacon_dir().join("config.json")
    }

    pub fn deacon_health_history_path(&self) -> PathBuf {
        self.deacon_dir().join("health-history.jsonl")
    }
}
