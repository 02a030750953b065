// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-engine: the coordination engine — Agent Supervisor, Specialist
//! Coordinator, Deacon health patrol, and Handoff Manager (spec §4.3-§4.7).

pub mod deacon;
pub mod handoff;
pub mod specialist;
pub mod supervisor;

pub use deacon::Deacon;
pub use handoff::HandoffManager;
pub use specialist::SpecialistCoordinator;
pub use supervisor::{AgentSupervisor, ListedAgent, SpawnOptions};
