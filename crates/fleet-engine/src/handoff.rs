// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handoff Manager: transfers in-flight work to another model (spec §4.7).

use std::time::Duration;

use fleet_core::{AgentId, Clock, FleetError, HandoffContext, HandoffMode, IdGen};
use fleet_session::SessionDriver;

use crate::specialist::{SpecialistBootstrap, SpecialistCoordinator, SpecialistTask};
use crate::supervisor::{AgentSupervisor, SpawnOptions};

const CAPTURE_LINES: u32 = 200;
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Result of a completed handoff.
#[derive(Debug, Clone)]
pub struct HandoffOutcome {
    pub mode_used: HandoffMode,
    pub handoff_path: std::path::PathBuf,
}

/// Cold-start parameters used only if a specialist-wake handoff targets an
/// uninitialized or dead specialist.
#[derive(Debug, Clone)]
pub struct SpecialistColdStart {
    pub bootstrap: SpecialistBootstrap,
    pub bootstrap_prompt: String,
}

/// Transfers work from one agent id to another model, per spec §4.7.
/// Stateless: every call takes the collaborators it needs, so one instance
/// serves both work-agent and specialist handoffs.
pub struct HandoffManager<C: Clock> {
    clock: C,
}

impl<C: Clock> HandoffManager<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Auto-detects the mode from `id`'s naming pattern unless `mode` is
    /// given explicitly (spec §4.7 "Auto-detection").
    fn resolve_mode(id: &AgentId, mode: Option<HandoffMode>) -> HandoffMode {
        mode.unwrap_or_else(|| {
            if id.as_specialist_role().is_some() {
                HandoffMode::SpecialistWake
            } else {
                HandoffMode::KillAndSpawn
            }
        })
    }

    /// Runs a handoff. `cold_start` is only consulted for `SpecialistWake`
    /// against an uninitialized or dead specialist.
    pub async fn handoff<S: SessionDriver, I: IdGen>(
        &self,
        supervisor: &AgentSupervisor<S, C, I>,
        coordinator: Option<&SpecialistCoordinator<S, C, I>>,
        id: &AgentId,
        target_model: &str,
        reason: &str,
        mode: Option<HandoffMode>,
        idle_timeout_ms: u64,
        cold_start: Option<SpecialistColdStart>,
    ) -> Result<HandoffOutcome, FleetError> {
        match Self::resolve_mode(id, mode) {
            HandoffMode::SpecialistWake => {
                let role = id
                    .as_specialist_role()
                    .ok_or_else(|| FleetError::NotASpecialist(id.as_str().to_string()))?;
                let coordinator = coordinator
                    .ok_or_else(|| FleetError::Precondition("specialist-wake handoff requires a coordinator".into()))?;

                let task = SpecialistTask {
                    issue_id: format!("handoff-{}", self.clock.now_ms()),
                    prompt: format!("## Handoff\n\nReason: {reason}\nTarget model: {target_model}\n"),
                    priority: fleet_core::hook::Priority::Urgent,
                    source: "handoff-manager".into(),
                    branch: None,
                    workspace: None,
                    pr_url: None,
                };

                let wake_result = match cold_start {
                    Some(cs) => {
                        coordinator
                            .wake_specialist_or_queue(role, task.clone(), cs.bootstrap, cs.bootstrap_prompt)
                            .await
                    }
                    None => coordinator.wake_specialist(role, &task).await,
                };

                match wake_result {
                    Ok(()) => Ok(HandoffOutcome {
                        mode_used: HandoffMode::SpecialistWake,
                        handoff_path: supervisor.store().paths().handoffs_dir(id.as_str()),
                    }),
                    Err(_) => {
                        self.kill_and_spawn(supervisor, id, target_model, reason, idle_timeout_ms)
                            .await
                    }
                }
            }
            HandoffMode::KillAndSpawn => {
                self.kill_and_spawn(supervisor, id, target_model, reason, idle_timeout_ms)
                    .await
            }
        }
    }

    async fn kill_and_spawn<S: SessionDriver, I: IdGen>(
        &self,
        supervisor: &AgentSupervisor<S, C, I>,
        id: &AgentId,
        target_model: &str,
        reason: &str,
        idle_timeout_ms: u64,
    ) -> Result<HandoffOutcome, FleetError> {
        let prior = supervisor
            .store()
            .read_state(id)
            .ok_or_else(|| FleetError::NoSuchAgent(id.as_str().to_string()))?;

        self.wait_for_idle(supervisor, id, idle_timeout_ms).await?;

        let captured_output = match supervisor.sessions().capture(id.as_str(), CAPTURE_LINES).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(agent = %id, error = %e, "handoff capture failed, proceeding with empty context");
                String::new()
            }
        };

        let context = HandoffContext {
            agent_id: id.as_str().to_string(),
            issue_id: prior.issue_id.clone(),
            target_model: target_model.to_string(),
            reason: reason.to_string(),
            git_branch: prior.branch.clone(),
            captured_output,
            relevant_files: Vec::new(),
        };
        let prompt = context.render_markdown();

        let handoff_path = supervisor
            .store()
            .paths()
            .handoffs_dir(id.as_str())
            .join(format!("handoff-{}.md", self.clock.now_ms()));
        if let Some(dir) = handoff_path.parent() {
            std::fs::create_dir_all(dir).map_err(FleetError::Io)?;
        }
        std::fs::write(&handoff_path, &prompt).map_err(FleetError::Io)?;

        supervisor.stop(id).await?;

        let spawn_result = supervisor
            .spawn(SpawnOptions {
                issue_id: prior.issue_id.clone(),
                workspace: prior.workspace.clone(),
                runtime: prior.runtime,
                model: target_model.to_string(),
                prompt: Some(prompt),
                phase: prior.phase.clone(),
                work_type: prior.work_type.clone(),
            })
            .await;

        match spawn_result {
            Ok(mut spec) => {
                spec.handoff_count = prior.handoff_count + 1;
                spec.branch = prior.branch;
                supervisor.store().write_state(&spec)?;
                Ok(HandoffOutcome {
                    mode_used: HandoffMode::KillAndSpawn,
                    handoff_path,
                })
            }
            Err(e) => {
                // The prior agent is already dead; mark it `error` per spec
                // §4.7 failure semantics and surface the failure.
                let mut dead = prior;
                dead.status = fleet_core::AgentStatus::Error;
                let _ = supervisor.store().write_state(&dead);
                Err(e)
            }
        }
    }

    /// Polls for idle (session absent or `runtime.json` reports idle) up to
    /// `idle_timeout_ms`, per spec §4.7 step 1. Bounded by wall-clock time,
    /// independent of the injected business `Clock`.
    async fn wait_for_idle<S: SessionDriver, I: IdGen>(
        &self,
        supervisor: &AgentSupervisor<S, C, I>,
        id: &AgentId,
        idle_timeout_ms: u64,
    ) -> Result<(), FleetError> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(idle_timeout_ms);
        loop {
            let alive = supervisor.sessions().exists(id.as_str()).await?;
            if !alive {
                return Ok(());
            }
            let runtime_idle = supervisor
                .store()
                .read_runtime(id)
                .map(|r| r.state == fleet_core::AgentState::Idle)
                .unwrap_or(false);
            if runtime_idle || tokio::time::Instant::now() >= deadline {
                return Ok(());
            }
            tokio::time::sleep(IDLE_POLL.min(Duration::from_millis(idle_timeout_ms.max(1)))).await;
        }
    }
}
