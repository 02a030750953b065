// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session management adapters (spec §4.1)

pub mod tmux;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from session operations, per spec §7 "transient multiplexer
/// errors" and "precondition violations".
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no such session: {0}")]
    NoSuchSession(String),
    #[error("session already running: {0}")]
    AlreadyRunning(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

impl From<SessionError> for fleet_core::FleetError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NoSuchSession(id) => fleet_core::FleetError::NoSuchSession(id),
            SessionError::AlreadyRunning(id) => fleet_core::FleetError::AlreadyRunning(id),
            SessionError::SpawnFailed(msg) => fleet_core::FleetError::SpawnFailed(msg),
            SessionError::CommandFailed(msg) => fleet_core::FleetError::Precondition(msg),
        }
    }
}

/// Minimal capability surface over a terminal multiplexer (spec §4.1).
///
/// No retries; every error is surfaced. This boundary exists so a faithful
/// reimplementation can stub it for tests (see `FakeDriver`).
#[async_trait]
pub trait SessionDriver: Clone + Send + Sync + 'static {
    /// Start a detached session named `id` executing `cmd` with working
    /// directory `cwd`. Fails with `AlreadyRunning` if `id` exists.
    async fn create(&self, id: &str, cwd: &Path, cmd: &str) -> Result<(), SessionError>;

    /// `true` if a session named `id` exists.
    async fn exists(&self, id: &str) -> Result<bool, SessionError>;

    /// Inject `text` followed by a submit keypress. Fails with
    /// `NoSuchSession` if absent.
    async fn send(&self, id: &str, text: &str) -> Result<(), SessionError>;

    /// Return the last `lines` of pane output as a string (bounded buffer).
    async fn capture(&self, id: &str, lines: u32) -> Result<String, SessionError>;

    /// Terminate the session. Idempotent.
    async fn kill(&self, id: &str) -> Result<(), SessionError>;

    /// Enumerate all sessions whose names start with the reserved prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, SessionError>;
}
