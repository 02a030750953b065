// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assembles the concrete Deacon patrol loop: real tmux sessions, the
//! system clock, and UUID ids, all rooted at one `FleetPaths`.

use std::collections::HashMap;

use fleet_core::{RuntimeKind, SpecialistRole, SystemClock, UuidIdGen};
use fleet_engine::specialist::SpecialistBootstrap;
use fleet_engine::{deacon::RoleBootstrap, Deacon, SpecialistCoordinator};
use fleet_session::TmuxDriver;
use fleet_store::{AgentStore, DeaconStateStore, FleetPaths, HeartbeatStore, SpecialistQueueStore};

use crate::LiveDeacon;

/// Per-role bootstrap inputs an operator supplies (or defaults, see
/// [`default_role_prompts`]). Distinct from [`RoleBootstrap`] only in that
/// it owns a plain `model`/`prompt` pair instead of a full
/// [`SpecialistBootstrap`] — the workspace directory is resolved here.
#[derive(Debug, Clone)]
pub struct RoleBootstrapPrompts {
    pub model: String,
    pub prompt: String,
}

/// Generic bootstrap prompt and default model for a role, used when the
/// operator hasn't configured one explicitly. Specific enough to be useful,
/// generic enough not to assume a particular runtime.
pub fn default_role_prompts() -> HashMap<SpecialistRole, RoleBootstrapPrompts> {
    let mut map = HashMap::new();
    map.insert(
        SpecialistRole::Review,
        RoleBootstrapPrompts {
            model: "sonnet".into(),
            prompt: "You review code changes assigned to you. Report findings with \
                     REVIEW_RESULT/FILES_REVIEWED/SECURITY_ISSUES/PERFORMANCE_ISSUES/NOTES \
                     marker lines."
                .into(),
        },
    );
    map.insert(
        SpecialistRole::Test,
        RoleBootstrapPrompts {
            model: "sonnet".into(),
            prompt: "You run and write tests for the change assigned to you. Report the \
                     outcome with TEST_RESULT/TEST_NOTES marker lines."
                .into(),
        },
    );
    map.insert(
        SpecialistRole::Merge,
        RoleBootstrapPrompts {
            model: "sonnet".into(),
            prompt: "You merge approved branches. Verify the working tree is clean and the \
                     source branch exists on the remote before merging."
                .into(),
        },
    );
    map.insert(
        SpecialistRole::Planning,
        RoleBootstrapPrompts {
            model: "opus".into(),
            prompt: "You break incoming work into issues for the work agents to pick up."
                .into(),
        },
    );
    map
}

fn role_bootstrap(paths: &FleetPaths, role: SpecialistRole, prompts: &RoleBootstrapPrompts) -> std::io::Result<RoleBootstrap> {
    let workspace = paths.specialist_dir(role.as_str()).join("workspace");
    std::fs::create_dir_all(&workspace)?;
    Ok(RoleBootstrap {
        bootstrap: SpecialistBootstrap {
            runtime: RuntimeKind::Claude,
            model: prompts.model.clone(),
            workspace: workspace.display().to_string(),
        },
        prompt: prompts.prompt.clone(),
    })
}

/// Builds the live `Deacon` patrol loop rooted at `paths`.
pub fn build_deacon(
    paths: FleetPaths,
    role_prompts: &HashMap<SpecialistRole, RoleBootstrapPrompts>,
) -> std::io::Result<LiveDeacon> {
    let store = AgentStore::new(paths.clone());
    let supervisor = fleet_engine::AgentSupervisor::new(store, TmuxDriver::new(), SystemClock, UuidIdGen);
    let queue = SpecialistQueueStore::new(paths.clone());
    let coordinator = SpecialistCoordinator::new(supervisor, queue, SystemClock);

    let defaults = default_role_prompts();
    let mut bootstraps = HashMap::new();
    for role in SpecialistRole::ALL {
        let prompts = role_prompts
            .get(&role)
            .or_else(|| defaults.get(&role))
            .expect("default covers every role");
        bootstraps.insert(role, role_bootstrap(&paths, role, prompts)?);
    }

    let state_store = DeaconStateStore::new(paths.clone());
    let heartbeats = HeartbeatStore::new(paths);

    Ok(Deacon::new(coordinator, state_store, heartbeats, SystemClock, bootstraps))
}
