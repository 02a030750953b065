// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist roles and the per-role queue item shape (spec §3
//! `SpecialistQueue item`, §4.4).

use crate::hook::Priority;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The fixed set of specialist roles, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialistRole {
    #[serde(rename = "review-agent")]
    Review,
    #[serde(rename = "test-agent")]
    Test,
    #[serde(rename = "merge-agent")]
    Merge,
    #[serde(rename = "planning-agent")]
    Planning,
}

impl SpecialistRole {
    pub const ALL: [SpecialistRole; 4] = [
        SpecialistRole::Review,
        SpecialistRole::Test,
        SpecialistRole::Merge,
        SpecialistRole::Planning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistRole::Review => "review-agent",
            SpecialistRole::Test => "test-agent",
            SpecialistRole::Merge => "merge-agent",
            SpecialistRole::Planning => "planning-agent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "review-agent" => Some(SpecialistRole::Review),
            "test-agent" => Some(SpecialistRole::Test),
            "merge-agent" => Some(SpecialistRole::Merge),
            "planning-agent" => Some(SpecialistRole::Planning),
            _ => None,
        }
    }

    /// Default per-role wake deadline, per spec §4.4 "5-20 minutes by role".
    pub fn default_wake_timeout_ms(&self) -> u64 {
        match self {
            SpecialistRole::Review => 10 * 60 * 1000,
            SpecialistRole::Test => 15 * 60 * 1000,
            SpecialistRole::Merge => 20 * 60 * 1000,
            SpecialistRole::Planning => 5 * 60 * 1000,
        }
    }
}

impl std::fmt::Display for SpecialistRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state machine for a specialist, per spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialistState {
    Uninitialized,
    Idle,
    Active,
    /// Session killed by auto-suspend with a stored session id, eligible
    /// for resume-by-session-id ahead of a fresh respawn (spec §4.6 step 4).
    Suspended,
    Dead,
}

/// One entry of `specialists/<role>/queue.jsonl`, per spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistQueueItem {
    pub id: String,
    pub priority: Priority,
    pub source: String,
    pub created_at: i64,
    pub payload: QueuedTaskPayload,
}

/// Task payload contract (spec §4.4): every queued task carries at minimum
/// `issue_id`; `branch`/`workspace`/`pr_url` are stored verbatim and used
/// as-is by the Deacon when draining.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTaskPayload {
    pub issue_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}
