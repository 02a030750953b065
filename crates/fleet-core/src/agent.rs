// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier and persisted state types (spec §3 `AgentId`,
//! `AgentState`, `AgentRuntimeState`).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Canonical agent identifier: `agent-<lowercased-issue-ref>` for work
    /// agents, `specialist-<role>` for specialists. Also the tmux session
    /// name.
    pub struct AgentId;
}

impl AgentId {
    /// `agent-<lowercased-issue-ref>`, per spec §3.
    pub fn for_issue(issue_ref: &str) -> Self {
        Self::new(format!("agent-{}", issue_ref.to_lowercase()))
    }

    /// `specialist-<role>`, per spec §3.
    pub fn for_specialist(role: crate::specialist::SpecialistRole) -> Self {
        Self::new(format!("specialist-{}", role.as_str()))
    }

    /// `true` if this id matches the `specialist-<role>` naming pattern,
    /// used by the Handoff Manager's mode auto-detection (spec §4.7).
    pub fn as_specialist_role(&self) -> Option<crate::specialist::SpecialistRole> {
        self.0
            .strip_prefix("specialist-")
            .and_then(crate::specialist::SpecialistRole::parse)
    }
}

/// Lifecycle status of an agent, per spec §3 `AgentState.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Starting,
    Running,
    Stopped,
    Error,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Starting => write!(f, "starting"),
            AgentStatus::Running => write!(f, "running"),
            AgentStatus::Stopped => write!(f, "stopped"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// `agents/<id>/state.json`, per spec §3 `AgentState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: AgentId,
    pub issue_id: String,
    pub workspace: String,
    pub runtime: crate::runtime_kind::RuntimeKind,
    pub model: String,
    pub status: AgentStatus,
    pub started_at: i64,
    pub last_activity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default)]
    pub handoff_count: u32,
    #[serde(default)]
    pub cost_so_far: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    /// Number of times `recover` has been applied to this agent.
    #[serde(default)]
    pub recovery_count: u32,
}

impl AgentSpec {
    pub fn new(
        id: AgentId,
        issue_id: impl Into<String>,
        workspace: impl Into<String>,
        runtime: crate::runtime_kind::RuntimeKind,
        model: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            issue_id: issue_id.into(),
            workspace: workspace.into(),
            runtime,
            model: model.into(),
            status: AgentStatus::Starting,
            started_at: now_ms,
            last_activity: now_ms,
            phase: None,
            work_type: None,
            session_id: None,
            branch: None,
            handoff_count: 0,
            cost_so_far: 0.0,
            complexity: None,
            recovery_count: 0,
        }
    }
}

/// Reported runtime phase for an agent, distinct from `AgentStatus`
/// (which tracks Supervisor-observed lifecycle). Populated by hook scripts
/// running inside the assistant, per spec §3 `AgentRuntimeState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Active,
    Idle,
    Suspended,
}

/// `agents/<id>/runtime.json`, per spec §3 `AgentRuntimeState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRuntimeState {
    pub state: AgentState,
    pub last_activity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AgentRuntimeState {
    pub fn active(now_ms: i64) -> Self {
        Self {
            state: AgentState::Active,
            last_activity: now_ms,
            suspended_at: None,
            session_id: None,
        }
    }

    /// Invariant (spec §3): `suspended` implies no live session and
    /// `sessionId` present.
    pub fn is_valid(&self) -> bool {
        if self.state == AgentState::Suspended {
            return self.session_id.is_some();
        }
        true
    }
}
