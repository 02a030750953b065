// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge-agent pre-flight, test-command detection, and result verification
//! (spec §4.4 merge-agent contract, §6 "Test-command detection", "Git
//! operations").

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("git command failed: {0}")]
    CommandFailed(String),
    #[error("working tree at {0} is dirty")]
    Dirty(PathBuf),
    #[error("source branch {0} is not reachable on remote")]
    SourceNotOnRemote(String),
}

impl From<MergeError> for fleet_core::FleetError {
    fn from(e: MergeError) -> Self {
        fleet_core::FleetError::Precondition(e.to_string())
    }
}

/// The conventional test invocation detected for a project, per spec §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCommand {
    Npm(String),
    Cargo,
    Maven,
    Python(String),
    Skip,
}

impl TestCommand {
    pub fn shell_command(&self) -> Option<String> {
        match self {
            TestCommand::Npm(script) => Some(format!("npm run {script}")),
            TestCommand::Cargo => Some("cargo test".to_string()),
            TestCommand::Maven => Some("mvn test".to_string()),
            TestCommand::Python(cmd) => Some(cmd.clone()),
            TestCommand::Skip => None,
        }
    }
}

/// Inspects standard project manifests to infer the test command, per spec
/// §6. Node takes priority, then Maven/Cargo/Python, then `Skip`.
pub fn detect_test_command(project_root: &Path) -> TestCommand {
    if let Some(script) = npm_test_script(project_root) {
        return TestCommand::Npm(script);
    }
    if project_root.join("pom.xml").is_file() {
        return TestCommand::Maven;
    }
    if project_root.join("Cargo.toml").is_file() {
        return TestCommand::Cargo;
    }
    if let Some(cmd) = python_test_command(project_root) {
        return TestCommand::Python(cmd);
    }
    TestCommand::Skip
}

fn npm_test_script(project_root: &Path) -> Option<String> {
    let manifest = std::fs::read_to_string(project_root.join("package.json")).ok()?;
    let value: serde_json::Value = serde_json::from_str(&manifest).ok()?;
    let script = value.get("scripts")?.get("test")?.as_str()?;
    if script.trim().is_empty() || script.contains("no test specified") {
        return None;
    }
    Some("test".to_string())
}

fn python_test_command(project_root: &Path) -> Option<String> {
    let has_pytest_ini = project_root.join("pytest.ini").is_file();
    let has_pyproject = project_root.join("pyproject.toml").is_file();
    let has_setup_cfg = project_root.join("setup.cfg").is_file();
    if has_pytest_ini || has_pyproject || has_setup_cfg {
        Some("pytest".to_string())
    } else {
        None
    }
}

/// Git operations the merge-agent's coordinator needs, abstracted so tests
/// can stub them (grounded on the `SessionDriver` boundary pattern, spec §4.1
/// rationale).
#[async_trait]
pub trait GitOps: Send + Sync + 'static {
    async fn current_head(&self, dir: &Path) -> Result<String, MergeError>;
    async fn remote_head(&self, dir: &Path, branch: &str) -> Result<Option<String>, MergeError>;
    async fn commit_message(&self, dir: &Path, sha: &str) -> Result<String, MergeError>;
    async fn dirty_paths(&self, dir: &Path) -> Result<Vec<String>, MergeError>;
}

/// Real `git` CLI implementation.
#[derive(Clone, Default)]
pub struct ProcessGit;

impl ProcessGit {
    async fn run(&self, dir: &Path, args: &[&str]) -> Result<String, MergeError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| MergeError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(MergeError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl GitOps for ProcessGit {
    async fn current_head(&self, dir: &Path) -> Result<String, MergeError> {
        self.run(dir, &["rev-parse", "HEAD"]).await
    }

    async fn remote_head(&self, dir: &Path, branch: &str) -> Result<Option<String>, MergeError> {
        let refspec = format!("refs/heads/{branch}");
        let out = self.run(dir, &["ls-remote", "origin", &refspec]).await?;
        Ok(out.split_whitespace().next().map(|s| s.to_string()))
    }

    async fn commit_message(&self, dir: &Path, sha: &str) -> Result<String, MergeError> {
        self.run(dir, &["log", "-1", "--format=%B", sha]).await
    }

    async fn dirty_paths(&self, dir: &Path) -> Result<Vec<String>, MergeError> {
        let out = self.run(dir, &["status", "--porcelain"]).await?;
        Ok(out
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l[3.min(l.len())..].trim().to_string())
            .collect())
    }
}

/// `{projectPath, sourceBranch, targetBranch, issueId}` given to the
/// merge-agent, per spec §4.4.
#[derive(Debug, Clone)]
pub struct MergeTask {
    pub project_path: PathBuf,
    pub source_branch: String,
    pub target_branch: String,
    pub issue_id: String,
}

/// Pre-flight validation performed *before* waking merge-agent, per spec
/// §4.4: "(i) source branch reachable on remote, (ii) no uncommitted changes
/// except those under a configurable ignore list."
pub async fn preflight(
    git: &dyn GitOps,
    task: &MergeTask,
    ignore: &[String],
) -> Result<(), MergeError> {
    if git.remote_head(&task.project_path, &task.source_branch).await?.is_none() {
        return Err(MergeError::SourceNotOnRemote(task.source_branch.clone()));
    }
    let dirty: Vec<_> = git
        .dirty_paths(&task.project_path)
        .await?
        .into_iter()
        .filter(|p| !ignore.iter().any(|ig| p.starts_with(ig.as_str())))
        .collect();
    if !dirty.is_empty() {
        return Err(MergeError::Dirty(task.project_path.clone()));
    }
    Ok(())
}

/// Polls the working tree for the merge-agent's completion, per spec §4.4:
/// "success is recognized as a new HEAD on `targetBranch` whose commit
/// message references `sourceBranch` *and* is present at the remote
/// reference." Per §9 Open Question (b), remote confirmation is required
/// even though the source sometimes accepts local merge alone.
pub async fn verify_merge_succeeded(
    git: &dyn GitOps,
    task: &MergeTask,
    head_before: &str,
) -> Result<bool, MergeError> {
    let head_now = git.current_head(&task.project_path).await?;
    if head_now == head_before {
        return Ok(false);
    }
    let message = git.commit_message(&task.project_path, &head_now).await?;
    if !message.contains(&task.source_branch) {
        return Ok(false);
    }
    let remote_head = git.remote_head(&task.project_path, &task.target_branch).await?;
    Ok(remote_head.as_deref() == Some(head_now.as_str()))
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct State {
        heads: HashMap<PathBuf, String>,
        remote_heads: HashMap<(PathBuf, String), String>,
        messages: HashMap<(PathBuf, String), String>,
        dirty: HashMap<PathBuf, Vec<String>>,
    }

    /// In-memory `GitOps` for deterministic merge-verification tests.
    #[derive(Clone, Default)]
    pub struct FakeGit {
        state: std::sync::Arc<Mutex<State>>,
    }

    impl FakeGit {
        pub fn set_head(&self, dir: &Path, sha: &str) {
            self.state.lock().heads.insert(dir.to_path_buf(), sha.to_string());
        }

        pub fn set_remote_head(&self, dir: &Path, branch: &str, sha: &str) {
            self.state
                .lock()
                .remote_heads
                .insert((dir.to_path_buf(), branch.to_string()), sha.to_string());
        }

        pub fn set_commit_message(&self, dir: &Path, sha: &str, message: &str) {
            self.state
                .lock()
                .messages
                .insert((dir.to_path_buf(), sha.to_string()), message.to_string());
        }

        pub fn set_dirty_paths(&self, dir: &Path, paths: Vec<String>) {
            self.state.lock().dirty.insert(dir.to_path_buf(), paths);
        }
    }

    #[async_trait]
    impl GitOps for FakeGit {
        async fn current_head(&self, dir: &Path) -> Result<String, MergeError> {
            Ok(self.state.lock().heads.get(dir).cloned().unwrap_or_default())
        }

        async fn remote_head(&self, dir: &Path, branch: &str) -> Result<Option<String>, MergeError> {
            Ok(self
                .state
                .lock()
                .remote_heads
                .get(&(dir.to_path_buf(), branch.to_string()))
                .cloned())
        }

        async fn commit_message(&self, dir: &Path, sha: &str) -> Result<String, MergeError> {
            Ok(self
                .state
                .lock()
                .messages
                .get(&(dir.to_path_buf(), sha.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn dirty_paths(&self, dir: &Path) -> Result<Vec<String>, MergeError> {
            Ok(self.state.lock().dirty.get(dir).cloned().unwrap_or_default())
        }
    }
}
