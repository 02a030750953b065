// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake session driver for testing.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SessionDriver, SessionError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded session call, for assertions in tests.
#[derive(Debug, Clone)]
pub enum SessionCall {
    Create { id: String, cwd: PathBuf, cmd: String },
    Send { id: String, text: String },
    Capture { id: String, lines: u32 },
    Kill { id: String },
    Exists { id: String },
    List { prefix: String },
}

/// Fake session record.
#[derive(Debug, Clone)]
pub struct FakeSessionRecord {
    pub cwd: PathBuf,
    pub cmd: String,
    pub alive: bool,
    pub output: Vec<String>,
    pub sent: Vec<String>,
}

struct FakeState {
    sessions: HashMap<String, FakeSessionRecord>,
    calls: Vec<SessionCall>,
}

/// In-memory `SessionDriver` for deterministic tests, grounded on the
/// teacher's `FakeSessionAdapter` pattern (spec §4.1: "this boundary exists
/// so a faithful reimplementation can stub it for tests").
#[derive(Clone)]
pub struct FakeDriver {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                sessions: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SessionCall> {
        self.inner.lock().calls.clone()
    }

    pub fn get(&self, id: &str) -> Option<FakeSessionRecord> {
        self.inner.lock().sessions.get(id).cloned()
    }

    pub fn set_output(&self, id: &str, lines: Vec<String>) {
        if let Some(s) = self.inner.lock().sessions.get_mut(id) {
            s.output = lines;
        }
    }

    /// Kills the session out from under the driver, simulating an external
    /// crash (used for `detectCrashed`/S4 scenario tests).
    pub fn simulate_external_death(&self, id: &str) {
        if let Some(s) = self.inner.lock().sessions.get_mut(id) {
            s.alive = false;
        }
    }
}

#[async_trait]
impl SessionDriver for FakeDriver {
    async fn create(&self, id: &str, cwd: &Path, cmd: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Create {
            id: id.to_string(),
            cwd: cwd.to_path_buf(),
            cmd: cmd.to_string(),
        });

        if inner.sessions.get(id).is_some_and(|s| s.alive) {
            return Err(SessionError::AlreadyRunning(id.to_string()));
        }

        inner.sessions.insert(
            id.to_string(),
            FakeSessionRecord {
                cwd: cwd.to_path_buf(),
                cmd: cmd.to_string(),
                alive: true,
                output: Vec::new(),
                sent: Vec::new(),
            },
        );
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Exists { id: id.to_string() });
        Ok(inner.sessions.get(id).is_some_and(|s| s.alive))
    }

    async fn send(&self, id: &str, text: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Send {
            id: id.to_string(),
            text: text.to_string(),
        });
        match inner.sessions.get_mut(id) {
            Some(s) if s.alive => {
                s.sent.push(text.to_string());
                Ok(())
            }
            _ => Err(SessionError::NoSuchSession(id.to_string())),
        }
    }

    async fn capture(&self, id: &str, lines: u32) -> Result<String, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Capture {
            id: id.to_string(),
            lines,
        });
        match inner.sessions.get(id) {
            Some(s) if s.alive => {
                let start = s.output.len().saturating_sub(lines as usize);
                Ok(s.output[start..].join("\n"))
            }
            _ => Err(SessionError::NoSuchSession(id.to_string())),
        }
    }

    async fn kill(&self, id: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Kill { id: id.to_string() });
        if let Some(s) = inner.sessions.get_mut(id) {
            s.alive = false;
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::List {
            prefix: prefix.to_string(),
        });
        Ok(inner
            .sessions
            .iter()
            .filter(|(id, s)| s.alive && id.starts_with(prefix))
            .map(|(id, _)| id.clone())
            .collect())
    }
}
