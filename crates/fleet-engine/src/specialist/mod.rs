// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist Coordinator: lifecycle and work queue for the four specialist
//! roles (spec §4.4).

pub mod markers;
pub mod merge;

use fleet_core::hook::Priority;
use fleet_core::specialist::{QueuedTaskPayload, SpecialistQueueItem, SpecialistRole, SpecialistState};
use fleet_core::{AgentId, AgentState, Clock, FleetError, IdGen, RuntimeKind};
use fleet_session::SessionDriver;
use fleet_store::{HistoryRecord, SpecialistQueueStore, WakeRecord};

use crate::supervisor::{AgentSupervisor, SpawnOptions};
use markers::{parse_review_report, parse_test_report, ReviewResult, TestVerdict};

/// Cold-start parameters for waking a specialist for the first time, per
/// spec §4.4 "specialists are spawned once and then woken, not respawned".
#[derive(Debug, Clone)]
pub struct SpecialistBootstrap {
    pub runtime: RuntimeKind,
    pub model: String,
    pub workspace: String,
}

/// A unit of work handed to a specialist, either immediately or via the
/// role's queue.
#[derive(Debug, Clone)]
pub struct SpecialistTask {
    pub issue_id: String,
    pub prompt: String,
    pub priority: Priority,
    pub source: String,
    pub branch: Option<String>,
    pub workspace: Option<String>,
    pub pr_url: Option<String>,
}

/// `queue_stats` result, per spec §4.4.
#[derive(Debug, Clone, Copy)]
pub struct QueueStats {
    pub has_work: bool,
    pub depth: usize,
    pub oldest_age_ms: Option<i64>,
}

/// Outcome of processing a review-agent or test-agent turn: whether the
/// originating work agent needs feedback relayed.
#[derive(Debug, Clone)]
pub struct ContractOutcome {
    pub approved: bool,
    pub feedback: Option<String>,
}

/// Coordinates the four specialist roles on top of an `AgentSupervisor` and
/// a per-role durable queue (spec §4.4).
pub struct SpecialistCoordinator<S: SessionDriver, C: Clock, I: IdGen> {
    supervisor: AgentSupervisor<S, C, I>,
    queue: SpecialistQueueStore,
    clock: C,
}

impl<S: SessionDriver, C: Clock, I: IdGen> SpecialistCoordinator<S, C, I> {
    pub fn new(supervisor: AgentSupervisor<S, C, I>, queue: SpecialistQueueStore, clock: C) -> Self {
        Self {
            supervisor,
            queue,
            clock,
        }
    }

    pub fn supervisor(&self) -> &AgentSupervisor<S, C, I> {
        &self.supervisor
    }

    /// Derives the specialist's lifecycle state from the Agent Store and
    /// live session existence (spec §4.4 state machine).
    pub async fn state(&self, role: SpecialistRole) -> Result<SpecialistState, FleetError> {
        let id = AgentId::for_specialist(role);
        let Some(_spec) = self.supervisor.store().read_state(&id) else {
            return Ok(SpecialistState::Uninitialized);
        };
        let alive = self.supervisor.sessions().exists(id.as_str()).await?;
        if !alive {
            let suspended = self
                .supervisor
                .store()
                .read_runtime(&id)
                .is_some_and(|r| r.state == AgentState::Suspended && r.session_id.is_some());
            return Ok(if suspended {
                SpecialistState::Suspended
            } else {
                SpecialistState::Dead
            });
        }
        match self.supervisor.store().read_runtime(&id) {
            Some(runtime) if runtime.state == AgentState::Active => Ok(SpecialistState::Active),
            _ => Ok(SpecialistState::Idle),
        }
    }

    /// Spawns a specialist for the first time. Idempotent: a no-op if the
    /// specialist is already alive (spec §4.4 `initialize`).
    pub async fn initialize(
        &self,
        role: SpecialistRole,
        bootstrap: SpecialistBootstrap,
        bootstrap_prompt: String,
    ) -> Result<(), FleetError> {
        match self.state(role).await? {
            SpecialistState::Uninitialized | SpecialistState::Dead => {}
            SpecialistState::Idle | SpecialistState::Active | SpecialistState::Suspended => return Ok(()),
        }
        let id = AgentId::for_specialist(role);
        let mut spec = self
            .supervisor
            .spawn(SpawnOptions {
                issue_id: id.as_str().to_string(),
                workspace: bootstrap.workspace,
                runtime: bootstrap.runtime,
                model: bootstrap.model,
                prompt: Some(bootstrap_prompt),
                phase: None,
                work_type: Some(role.as_str().to_string()),
            })
            .await?;
        self.capture_and_store_session_id(role, &id, &mut spec).await?;
        Ok(())
    }

    /// Captures the assistant-reported resume token from the session's own
    /// pane output and persists it, both on `AgentSpec.session_id` and in
    /// `specialists/<role>/session-id.txt` (spec §4.4 `initialize`: "capture
    /// the assistant-reported session id and store it").
    async fn capture_and_store_session_id(
        &self,
        role: SpecialistRole,
        id: &AgentId,
        spec: &mut fleet_core::AgentSpec,
    ) -> Result<(), FleetError> {
        let pane = self.supervisor.sessions().capture(id.as_str(), 200).await?;
        if let Some(session_id) = markers::extract_session_id(&pane) {
            self.queue.write_session_id(role, &session_id)?;
            spec.session_id = Some(session_id);
            self.supervisor.store().write_state(spec)?;
        }
        Ok(())
    }

    /// Resumes a suspended specialist using its persisted session id instead
    /// of spawning fresh (spec §4.6 step 4, §4.4 "resumable via a stored
    /// sessionId").
    pub async fn resume(&self, role: SpecialistRole, prompt: &str) -> Result<(), FleetError> {
        let session_id = self.queue.read_session_id(role).ok_or_else(|| {
            FleetError::Precondition(format!("no stored session id to resume {role}"))
        })?;
        let id = AgentId::for_specialist(role);
        self.supervisor.resume(&id, &session_id, prompt).await?;
        self.supervisor
            .store()
            .write_runtime(&id, &fleet_core::AgentRuntimeState::active(self.clock.now_ms()))?;
        Ok(())
    }

    /// Wakes an already-initialized specialist directly, bypassing the
    /// queue. Callers that don't know whether a specialist is busy should
    /// use `wake_specialist_or_queue` instead.
    pub async fn wake_specialist(&self, role: SpecialistRole, task: &SpecialistTask) -> Result<(), FleetError> {
        let id = AgentId::for_specialist(role);
        self.queue.log_wake(
            role,
            &WakeRecord {
                at_ms: self.clock.now_ms(),
                item_id: task.issue_id.clone(),
                reason: "direct".into(),
            },
        )?;
        self.supervisor.message(&id, &task.prompt).await
    }

    /// Wakes the specialist if idle, otherwise enqueues the task. Urgent
    /// tasks jump the queue via priority ordering in `peek_next`/`check`,
    /// but never preempt a session that is already `Active` (spec §4.4).
    pub async fn wake_specialist_or_queue(
        &self,
        role: SpecialistRole,
        task: SpecialistTask,
        bootstrap: SpecialistBootstrap,
        bootstrap_prompt: String,
    ) -> Result<(), FleetError> {
        match self.state(role).await? {
            SpecialistState::Active => {
                self.enqueue(role, task)?;
                Ok(())
            }
            SpecialistState::Uninitialized | SpecialistState::Dead => {
                self.initialize(role, bootstrap, bootstrap_prompt).await?;
                self.wake_specialist(role, &task).await
            }
            SpecialistState::Idle => self.wake_specialist(role, &task).await,
            SpecialistState::Suspended => self.resume(role, &task.prompt).await,
        }
    }

    fn enqueue(&self, role: SpecialistRole, task: SpecialistTask) -> Result<(), FleetError> {
        let item = SpecialistQueueItem {
            id: format!("{}-{}", role.as_str(), self.clock.now_ms()),
            priority: task.priority,
            source: task.source,
            created_at: self.clock.now_ms(),
            payload: QueuedTaskPayload {
                issue_id: task.issue_id,
                branch: task.branch,
                workspace: task.workspace,
                pr_url: task.pr_url,
                context: Default::default(),
            },
        };
        self.queue.push(role, &item)?;
        Ok(())
    }

    /// Highest-priority, earliest-arrived queued task, without removing it.
    pub fn next_task(&self, role: SpecialistRole) -> Result<Option<SpecialistQueueItem>, FleetError> {
        Ok(self.queue.peek_next(role)?)
    }

    /// Marks a queued task done. Invariant (spec §4.4): only the task the
    /// specialist is currently processing may be completed. Rejects a
    /// `task_id` that isn't the current head of the queue; a queue that's
    /// already empty (the task was already completed) is a harmless no-op.
    pub fn complete_task(&self, role: SpecialistRole, task_id: &str, outcome: &str) -> Result<bool, FleetError> {
        if let Some(next) = self.next_task(role)? {
            if next.id != task_id {
                return Err(FleetError::Precondition(format!(
                    "{task_id} is not the current head of the {role} queue"
                )));
            }
        }
        let removed = self.queue.remove(role, task_id)?;
        if removed {
            self.queue.log_history(
                role,
                &HistoryRecord {
                    at_ms: self.clock.now_ms(),
                    item_id: task_id.to_string(),
                    outcome: outcome.to_string(),
                },
            )?;
        }
        Ok(removed)
    }

    pub fn queue_stats(&self, role: SpecialistRole) -> Result<QueueStats, FleetError> {
        let items = self.queue.list(role)?;
        let now = self.clock.now_ms();
        let oldest_age_ms = items.iter().map(|i| now - i.created_at).max();
        Ok(QueueStats {
            has_work: !items.is_empty(),
            depth: items.len(),
            oldest_age_ms,
        })
    }

    /// Applies the review-agent contract to captured output (spec §4.4):
    /// on `CHANGES_REQUESTED`, the originating work agent is sent feedback
    /// via its mailbox.
    pub async fn handle_review_output(&self, issue_id: &str, output: &str) -> Result<ContractOutcome, FleetError> {
        let report = parse_review_report(output);
        match report.result {
            Some(ReviewResult::ChangesRequested) => {
                let feedback = render_review_feedback(&report);
                self.supervisor.message(&AgentId::for_issue(issue_id), &feedback).await?;
                Ok(ContractOutcome {
                    approved: false,
                    feedback: Some(feedback),
                })
            }
            Some(ReviewResult::Approved) | Some(ReviewResult::Commented) | None => {
                Ok(ContractOutcome {
                    approved: matches!(report.result, Some(ReviewResult::Approved)),
                    feedback: None,
                })
            }
        }
    }

    /// Applies the test-agent contract: on `FAIL`, relays notes to the
    /// originating work agent (spec §4.4 "analogous" to review-agent).
    pub async fn handle_test_output(&self, issue_id: &str, output: &str) -> Result<ContractOutcome, FleetError> {
        let report = parse_test_report(output);
        match report.result {
            Some(TestVerdict::Fail) => {
                let feedback = format!(
                    "## Test failure\n\n{}\n",
                    report.notes.as_deref().unwrap_or("Tests failed; no further detail was provided.")
                );
                self.supervisor.message(&AgentId::for_issue(issue_id), &feedback).await?;
                Ok(ContractOutcome {
                    approved: false,
                    feedback: Some(feedback),
                })
            }
            Some(TestVerdict::Pass) => Ok(ContractOutcome {
                approved: true,
                feedback: None,
            }),
            None => Ok(ContractOutcome {
                approved: false,
                feedback: None,
            }),
        }
    }
}

fn render_review_feedback(report: &markers::ReviewReport) -> String {
    let mut out = String::from("## Review feedback\n\n");
    if !report.security_issues.is_empty() {
        out.push_str("Security issues:\n");
        for issue in &report.security_issues {
            out.push_str(&format!("- {issue}\n"));
        }
    }
    if !report.performance_issues.is_empty() {
        out.push_str("Performance issues:\n");
        for issue in &report.performance_issues {
            out.push_str(&format!("- {issue}\n"));
        }
    }
    if let Some(notes) = &report.notes {
        out.push_str(&format!("Notes: {notes}\n"));
    }
    out
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
