// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Supervisor: reconciles intended state in the Agent Store with
//! actual Session Driver state (spec §4.3).

use fleet_core::hook::Priority;
use fleet_core::{AgentId, AgentSpec, AgentStatus, Clock, FleetError, IdGen, RuntimeKind};
use fleet_session::SessionDriver;
use fleet_store::{AgentStore, Hook, Mailbox};

/// Arguments to `spawn`, per spec §4.3 `opts`.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub issue_id: String,
    pub workspace: String,
    pub runtime: RuntimeKind,
    pub model: String,
    pub prompt: Option<String>,
    pub phase: Option<String>,
    pub work_type: Option<String>,
}

/// `list()` result row: store state joined with actual session existence.
#[derive(Debug, Clone)]
pub struct ListedAgent {
    pub spec: AgentSpec,
    pub tmux_active: bool,
}

/// Reconciles `AgentStore` state against a `SessionDriver`, generic so
/// production code and tests share one implementation (spec §4.1 rationale).
pub struct AgentSupervisor<S: SessionDriver, C: Clock, I: IdGen> {
    store: AgentStore,
    mailbox: Mailbox,
    sessions: S,
    clock: C,
    id_gen: I,
}

impl<S: SessionDriver, C: Clock, I: IdGen> AgentSupervisor<S, C, I> {
    pub fn new(store: AgentStore, sessions: S, clock: C, id_gen: I) -> Self {
        let mailbox = Mailbox::new(store.paths().clone());
        Self {
            store,
            mailbox,
            sessions,
            clock,
            id_gen,
        }
    }

    pub(crate) fn hook(&self) -> Hook<C, I> {
        Hook::new(self.store.paths().clone(), self.clock.clone(), self.id_gen.clone())
    }

    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Starts a new agent, per spec §4.3 `spawn`.
    pub async fn spawn(&self, opts: SpawnOptions) -> Result<AgentSpec, FleetError> {
        let id = AgentId::for_issue(&opts.issue_id);
        if self.sessions.exists(id.as_str()).await? {
            return Err(FleetError::AlreadyRunning(id.as_str().to_string()));
        }

        let hook = self.hook();
        hook.init(&id)?;
        let pending = hook.check(&id)?;

        let mut prompt = opts.prompt.unwrap_or_default();
        if pending.has_work {
            if let Some(startup) = hook.generate_startup_prompt(&id)? {
                prompt = format!("{startup}\n{prompt}");
            }
        }

        self.store.init_agent_dir(&id)?;
        let now = self.clock.now_ms();
        let mut spec = AgentSpec::new(
            id.clone(),
            opts.issue_id,
            opts.workspace.clone(),
            opts.runtime,
            opts.model.clone(),
            now,
        );
        spec.phase = opts.phase;
        spec.work_type = opts.work_type;
        self.store.write_state(&spec)?;

        let cmd = opts.runtime.command(&opts.model, &prompt);
        match self
            .sessions
            .create(id.as_str(), opts.workspace.as_ref(), &cmd)
            .await
        {
            Ok(()) => {
                spec.status = AgentStatus::Running;
                spec.last_activity = self.clock.now_ms();
                self.store.write_state(&spec)?;
                Ok(spec)
            }
            Err(e) => {
                // state.json is left at `starting`; caller retries or tears down.
                Err(e.into())
            }
        }
    }

    /// Injects a message into a live session and records a copy in the
    /// agent's mailbox (spec §4.3 `message`).
    pub async fn message(&self, id: &AgentId, text: &str) -> Result<(), FleetError> {
        if !self.sessions.exists(id.as_str()).await? {
            return Err(FleetError::NoSuchSession(id.as_str().to_string()));
        }
        self.sessions.send(id.as_str(), text).await?;
        self.mailbox.send_mail(id, "supervisor", text, Priority::Normal)?;
        Ok(())
    }

    /// Kills the session (if any) and marks the agent stopped. Idempotent.
    pub async fn stop(&self, id: &AgentId) -> Result<(), FleetError> {
        self.sessions.kill(id.as_str()).await?;
        if let Some(mut spec) = self.store.read_state(id) {
            spec.status = AgentStatus::Stopped;
            self.store.write_state(&spec)?;
        }
        Ok(())
    }

    /// Joins Store contents with actual session existence (spec §4.3 `list`).
    pub async fn list(&self) -> Result<Vec<ListedAgent>, FleetError> {
        let mut out = Vec::new();
        for id in self.store.list_agent_ids()? {
            let Some(spec) = self.store.read_state(&id) else {
                continue;
            };
            let tmux_active = self.sessions.exists(id.as_str()).await?;
            out.push(ListedAgent { spec, tmux_active });
        }
        Ok(out)
    }

    /// Agents whose `state.json` says `running` but whose session is gone
    /// (spec §8 property 5).
    pub async fn detect_crashed(&self) -> Result<Vec<AgentId>, FleetError> {
        let mut crashed = Vec::new();
        for id in self.store.list_agent_ids()? {
            let Some(spec) = self.store.read_state(&id) else {
                continue;
            };
            if spec.status == AgentStatus::Running && !self.sessions.exists(id.as_str()).await? {
                crashed.push(id);
            }
        }
        Ok(crashed)
    }

    /// Re-spawns a crashed agent with a recovery prompt (spec §4.3 `recover`).
    pub async fn recover(&self, id: &AgentId) -> Result<AgentSpec, FleetError> {
        let prior = self
            .store
            .read_state(id)
            .ok_or_else(|| FleetError::NoSuchAgent(id.as_str().to_string()))?;

        let hook = self.hook();
        let pending = hook.check(id)?;
        let mut prompt = format!(
            "## Recovery\n\nResuming work on issue {} (workspace: {}, branch: {}, started at {}).\n",
            prior.issue_id,
            prior.workspace,
            prior.branch.as_deref().unwrap_or("unknown"),
            prior.started_at,
        );
        if pending.has_work {
            if let Some(startup) = hook.generate_startup_prompt(id)? {
                prompt.push('\n');
                prompt.push_str(&startup);
            }
        }

        let cmd = prior.runtime.command(&prior.model, &prompt);
        match self
            .sessions
            .create(id.as_str(), prior.workspace.as_ref(), &cmd)
            .await
        {
            Ok(()) => {
                let mut spec = prior;
                spec.status = AgentStatus::Running;
                spec.last_activity = self.clock.now_ms();
                spec.recovery_count += 1;
                self.store.write_state(&spec)?;
                Ok(spec)
            }
            Err(e) => {
                let mut spec = prior;
                spec.status = AgentStatus::Error;
                // Best-effort: surface the recovery failure but still persist
                // that we tried, per spec §4.3 "Recovery is best-effort".
                let _ = self.store.write_state(&spec);
                Err(e.into())
            }
        }
    }

    /// Resumes a dead agent's most recent assistant session using a stored
    /// resume token rather than spawning a fresh one (spec §4.4 "its session
    /// is resumable via a stored sessionId"; §6 "the command includes
    /// `--resume <session-id>`").
    pub async fn resume(&self, id: &AgentId, session_id: &str, prompt: &str) -> Result<AgentSpec, FleetError> {
        let mut spec = self
            .store
            .read_state(id)
            .ok_or_else(|| FleetError::NoSuchAgent(id.as_str().to_string()))?;
        if self.sessions.exists(id.as_str()).await? {
            return Err(FleetError::AlreadyRunning(id.as_str().to_string()));
        }

        let cmd = spec.runtime.resume_command(&spec.model, session_id, prompt);
        self.sessions
            .create(id.as_str(), spec.workspace.as_ref(), &cmd)
            .await?;
        spec.status = AgentStatus::Running;
        spec.last_activity = self.clock.now_ms();
        spec.session_id = Some(session_id.to_string());
        self.store.write_state(&spec)?;
        Ok(spec)
    }

    /// Applies `recover` to every crashed agent (spec §4.3 `autoRecoverAll`).
    pub async fn auto_recover_all(&self) -> Result<Vec<(AgentId, Result<(), FleetError>)>, FleetError> {
        let mut results = Vec::new();
        for id in self.detect_crashed().await? {
            let outcome = self.recover(&id).await.map(|_| ());
            results.push((id, outcome));
        }
        Ok(results)
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
