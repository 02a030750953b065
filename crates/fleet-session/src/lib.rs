// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-session: thin session-multiplexer wrapper (spec §4.1 Session
//! Driver). No retries — errors are surfaced to callers so a faithful
//! reimplementation can stub this boundary for tests.

mod session;

pub use session::{SessionDriver, SessionError};
pub use session::tmux::TmuxDriver;

#[cfg(any(test, feature = "test-support"))]
pub use session::fake::{FakeDriver, FakeSessionRecord, SessionCall};
