// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux session driver (spec §4.1, §6 "multiplexer boundary").

use super::{SessionDriver, SessionError};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Tmux-based session driver.
#[derive(Clone, Default)]
pub struct TmuxDriver;

impl TmuxDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionDriver for TmuxDriver {
    async fn create(&self, id: &str, cwd: &Path, cmd: &str) -> Result<(), SessionError> {
        if !cwd.exists() {
            return Err(SessionError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        if self.exists(id).await? {
            return Err(SessionError::AlreadyRunning(id.to_string()));
        }

        let output = Command::new("tmux")
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(id)
            .arg("-c")
            .arg(cwd)
            .arg(cmd)
            .output()
            .await
            .map_err(|e| SessionError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session = id, stderr = %stderr, "tmux spawn failed");
            return Err(SessionError::SpawnFailed(stderr.to_string()));
        }

        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool, SessionError> {
        let output = Command::new("tmux")
            .args(["has-session", "-t", id])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;
        Ok(output.status.success())
    }

    async fn send(&self, id: &str, text: &str) -> Result<(), SessionError> {
        if !self.exists(id).await? {
            return Err(SessionError::NoSuchSession(id.to_string()));
        }

        let literal = Command::new("tmux")
            .args(["send-keys", "-t", id, "-l", "--", text])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;
        if !literal.status.success() {
            return Err(SessionError::NoSuchSession(id.to_string()));
        }

        let enter = Command::new("tmux")
            .args(["send-keys", "-t", id, "Enter"])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;
        if !enter.status.success() {
            return Err(SessionError::NoSuchSession(id.to_string()));
        }

        Ok(())
    }

    async fn capture(&self, id: &str, lines: u32) -> Result<String, SessionError> {
        let output = Command::new("tmux")
            .args([
                "capture-pane",
                "-t",
                id,
                "-p",
                "-S",
                &format!("-{}", lines),
            ])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(SessionError::NoSuchSession(id.to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn kill(&self, id: &str) -> Result<(), SessionError> {
        // Idempotent: a failing kill-session means the session is already gone.
        let _ = Command::new("tmux")
            .args(["kill-session", "-t", id])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, SessionError> {
        let output = Command::new("tmux")
            .args(["list-sessions", "-F", "#{session_name}"])
            .output()
            .await
            .map_err(|e| SessionError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            // No server running means no sessions at all.
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .filter(|name| name.starts_with(prefix))
            .map(|s| s.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmux_driver_is_clone_and_default() {
        let _driver = TmuxDriver::default();
        let _cloned = _driver.clone();
    }
}
