// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleetd: the Deacon patrol daemon. A single long-lived process ticking
//! `Deacon::patrol_once` on an interval; all real state lives under
//! `FleetPaths` on disk, so the daemon itself is disposable.

mod config;
mod lock;
mod logging;
mod wiring;

pub use config::{Config, ConfigError};
pub use lock::{DaemonLock, LockError};
pub use logging::{rotate_log_if_needed, setup_logging};
pub use wiring::{build_deacon, default_role_prompts, RoleBootstrapPrompts};

use fleet_core::{SystemClock, UuidIdGen};
use fleet_session::TmuxDriver;

/// The concrete `Deacon` instantiation fleetd runs: real tmux sessions, the
/// system clock, and UUID-based ids. Everything upstream of `main` is
/// generic so tests can substitute `FakeDriver`/`FakeClock` instead.
pub type LiveDeacon = fleet_engine::Deacon<TmuxDriver, SystemClock, UuidIdGen>;
