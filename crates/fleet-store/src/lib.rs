// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-store: durable per-agent directories, the fixed-point work hook,
//! mailbox, specialist queues, and Deacon health state (spec §3, §4.2).
//!
//! The file system *is* the state store. Every write is temp-file + rename;
//! `hook.json` writes additionally hold an advisory file lock for the
//! duration of the read-modify-write (spec §3 "Ownership").

mod atomic;
mod deacon_state;
mod error;
mod heartbeat;
mod hook;
mod mailbox;
mod paths;
mod specialist_queue;
mod store;

pub use deacon_state::{DeaconStateStore, HealthHistoryEntry};
pub use error::StoreError;
pub use heartbeat::HeartbeatStore;
pub use hook::{CheckResult, Hook};
pub use mailbox::Mailbox;
pub use paths::{FleetPaths, ROOT_ENV_VAR};
pub use specialist_queue::{HistoryRecord, SpecialistQueueStore, WakeRecord};
pub use store::AgentStore;
