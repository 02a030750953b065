// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat freshness classification, per spec §4.5 / §8 property 10.

use serde::{Deserialize, Serialize};

/// `heartbeats/<session-name>.json`, written by hook scripts running inside
/// the assistant process (spec §3 `Heartbeat`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub timestamp: i64,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Heartbeat {
    /// Fresh iff `now - timestamp < ping_timeout_ms` (spec §4.5).
    /// A heartbeat whose `timestamp + ping_timeout < now` is treated
    /// identically to an absent file (spec §8 property 10).
    pub fn is_fresh(&self, now_ms: i64, ping_timeout_ms: i64) -> bool {
        now_ms - self.timestamp < ping_timeout_ms
    }
}

/// Classification of an agent's liveness from the heartbeat + session-exists
/// channels, per spec §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatStatus {
    /// Fresh heartbeat, session alive.
    Active,
    /// Heartbeat older than `ping_timeout_ms`, session alive.
    Stale,
    /// No heartbeat file at all, session alive (hooks unconfigured).
    Warning,
    /// No session.
    Dead,
}

impl HeartbeatStatus {
    pub fn classify(
        heartbeat: Option<&Heartbeat>,
        session_alive: bool,
        now_ms: i64,
        ping_timeout_ms: i64,
    ) -> Self {
        if !session_alive {
            return HeartbeatStatus::Dead;
        }
        match heartbeat {
            Some(hb) if hb.is_fresh(now_ms, ping_timeout_ms) => HeartbeatStatus::Active,
            Some(_) => HeartbeatStatus::Stale,
            None => HeartbeatStatus::Warning,
        }
    }
}
