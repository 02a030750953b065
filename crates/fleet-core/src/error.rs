// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the control plane (spec §7).

use thiserror::Error;

/// Typed failures surfaced by public operations across the control plane.
///
/// Per-crate errors (`fleet-session::SessionError`, `fleet-store::StoreError`)
/// convert into this at crate boundaries so `fleet-engine` callers see one
/// error type.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("agent already running: {0}")]
    AlreadyRunning(String),

    #[error("no such agent: {0}")]
    NoSuchAgent(String),

    #[error("no such session: {0}")]
    NoSuchSession(String),

    #[error("not a specialist: {0}")]
    NotASpecialist(String),

    #[error("force-kill cooldown active for {role}, {remaining_ms}ms remaining")]
    Cooldown { role: String, remaining_ms: i64 },

    #[error("session spawn failed: {0}")]
    SpawnFailed(String),

    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    #[error("reorder does not match current item set")]
    ReorderMismatch,

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl FleetError {
    /// Maps to the CLI exit-code taxonomy of spec §6, for callers that need
    /// it (the CLI itself is out of scope here).
    pub fn exit_code(&self) -> i32 {
        match self {
            FleetError::AlreadyRunning(_) | FleetError::Cooldown { .. } => 2,
            FleetError::NoSuchAgent(_) | FleetError::NoSuchSession(_) => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_maps_precondition_violations_to_two() {
        assert_eq!(FleetError::AlreadyRunning("x".into()).exit_code(), 2);
        assert_eq!(
            FleetError::Cooldown {
                role: "review-agent".into(),
                remaining_ms: 1000
            }
            .exit_code(),
            2
        );
    }

    #[test]
    fn exit_code_maps_not_found_to_three() {
        assert_eq!(FleetError::NoSuchAgent("agent-x".into()).exit_code(), 3);
    }

    #[test]
    fn exit_code_defaults_to_one() {
        assert_eq!(FleetError::SpawnFailed("boom".into()).exit_code(), 1);
    }
}
