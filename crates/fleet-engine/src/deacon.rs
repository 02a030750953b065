// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deacon: the single cooperative health-patrol loop (spec §4.6).

use std::collections::HashMap;

use fleet_core::health::SpecialistHealthState;
use fleet_core::specialist::SpecialistRole;
use fleet_core::{AgentId, AgentRuntimeState, AgentState, Clock, DeaconConfig, FleetError, HeartbeatStatus, IdGen};
use fleet_session::SessionDriver;
use fleet_store::{DeaconStateStore, HealthHistoryEntry, HeartbeatStore};

use crate::specialist::{SpecialistBootstrap, SpecialistCoordinator};

/// Per-role cold-start parameters the Deacon uses when auto-initializing a
/// role, supplied once at construction.
#[derive(Debug, Clone)]
pub struct RoleBootstrap {
    pub bootstrap: SpecialistBootstrap,
    pub prompt: String,
}

/// Result of `check_specialist_health`, per spec §4.6 step 1.
#[derive(Debug, Clone, Copy)]
struct HealthCheck {
    was_running: bool,
    should_force_kill: bool,
    in_cooldown: bool,
}

/// One patrol tick's summary, useful for tests and logging.
#[derive(Debug, Clone, Default)]
pub struct PatrolReport {
    pub force_killed: Vec<SpecialistRole>,
    pub initialized: Vec<SpecialistRole>,
    pub drained: Vec<SpecialistRole>,
    pub suspended: Vec<AgentId>,
    pub mass_death_alert: bool,
}

/// The health-monitor loop. Owns no in-memory state beyond its collaborators
/// — every decision is made by reading files, so ticks are safe to run from
/// a fresh process (spec §4.6 "Concurrency").
pub struct Deacon<S: SessionDriver, C: Clock, I: IdGen> {
    coordinator: SpecialistCoordinator<S, C, I>,
    state_store: DeaconStateStore,
    heartbeats: HeartbeatStore,
    clock: C,
    bootstraps: HashMap<SpecialistRole, RoleBootstrap>,
}

impl<S: SessionDriver, C: Clock, I: IdGen> Deacon<S, C, I> {
    pub fn new(
        coordinator: SpecialistCoordinator<S, C, I>,
        state_store: DeaconStateStore,
        heartbeats: HeartbeatStore,
        clock: C,
        bootstraps: HashMap<SpecialistRole, RoleBootstrap>,
    ) -> Self {
        Self {
            coordinator,
            state_store,
            heartbeats,
            clock,
            bootstraps,
        }
    }

    /// Runs one full patrol cycle over every role in `SpecialistRole::ALL`,
    /// per spec §4.6. Never fails: a problem with one role is logged and the
    /// loop continues (spec §7 "internal helpers within the Deacon loop
    /// never throw").
    pub async fn patrol_once(&self, config: &DeaconConfig) -> Result<PatrolReport, FleetError> {
        let mut report = PatrolReport::default();
        for role in SpecialistRole::ALL {
            if let Err(e) = self.patrol_role(role, config, &mut report).await {
                tracing::warn!(role = %role, error = %e, "patrol step failed for role, continuing");
            }
        }
        self.suspend_idle_work_agents(config, &mut report).await?;
        self.check_mass_death(config, &mut report)?;
        Ok(report)
    }

    async fn patrol_role(
        &self,
        role: SpecialistRole,
        config: &DeaconConfig,
        report: &mut PatrolReport,
    ) -> Result<(), FleetError> {
        let id = AgentId::for_specialist(role);
        let now = self.clock.now_ms();
        let check = self.check_specialist_health(role, &id, config, now).await?;

        if check.should_force_kill {
            self.force_kill(role, &id, now).await?;
            report.force_killed.push(role);
            self.coordinator
                .initialize(
                    role,
                    self.bootstrap_for(role).bootstrap.clone(),
                    self.bootstrap_for(role).prompt.clone(),
                )
                .await?;
            report.initialized.push(role);
            self.record_health_history(role, "auto_restart")?;
            return Ok(());
        }

        if !check.was_running && !check.in_cooldown {
            use fleet_core::specialist::SpecialistState;
            // A merely-suspended specialist still has a resumable session;
            // respawning it fresh here would defeat auto-suspend. It's left
            // alone until `drain_queue` resumes it for queued work.
            if self.coordinator.state(role).await? != SpecialistState::Suspended {
                self.coordinator
                    .initialize(
                        role,
                        self.bootstrap_for(role).bootstrap.clone(),
                        self.bootstrap_for(role).prompt.clone(),
                    )
                    .await?;
                report.initialized.push(role);
                self.record_health_history(role, "auto_restart")?;
            }
        }

        self.drain_queue(role, report).await?;
        Ok(())
    }

    fn bootstrap_for(&self, role: SpecialistRole) -> &RoleBootstrap {
        self.bootstraps
            .get(&role)
            .unwrap_or_else(|| panic!("no RoleBootstrap configured for {role}"))
    }

    fn record_health_history(&self, role: SpecialistRole, event: &str) -> Result<(), FleetError> {
        Ok(self.state_store.append_health_history(&HealthHistoryEntry {
            at_ms: self.clock.now_ms(),
            specialist_name: role.as_str().to_string(),
            event: event.to_string(),
        })?)
    }

    /// Step 1: classifies a role's liveness and updates persisted counters.
    /// `was_running` reflects actual multiplexer session liveness (spec
    /// §4.5 "no session → dead"), not the Supervisor-observed status field.
    async fn check_specialist_health(
        &self,
        role: SpecialistRole,
        id: &AgentId,
        config: &DeaconConfig,
        now: i64,
    ) -> Result<HealthCheck, FleetError> {
        let was_running = self.coordinator.supervisor().sessions().exists(id.as_str()).await?;
        let heartbeat = self.heartbeats.read(id.as_str());
        let status = HeartbeatStatus::classify(heartbeat.as_ref(), was_running, now, config.ping_timeout_ms);

        let state = self.state_store.update_state(|state| {
            let health = state.health_for(role);
            match status {
                HeartbeatStatus::Active => health.reset_failures(),
                HeartbeatStatus::Stale => health.consecutive_failures += 1,
                HeartbeatStatus::Warning | HeartbeatStatus::Dead => {}
            }
            if let Some(hb) = &heartbeat {
                health.last_response_time = Some(hb.timestamp);
            }
        })?;

        let health = state.specialists.get(role.as_str()).cloned().unwrap_or_else(|| SpecialistHealthState::new(role));
        let in_cooldown = health.in_cooldown(now, config.cooldown_ms);
        let should_force_kill = was_running
            && health.consecutive_failures >= config.consecutive_failures
            && !in_cooldown;

        Ok(HealthCheck {
            was_running,
            should_force_kill,
            in_cooldown,
        })
    }

    /// Step 2: kills the session, starts the cooldown, records a death.
    async fn force_kill(&self, role: SpecialistRole, id: &AgentId, now: i64) -> Result<(), FleetError> {
        // `kill` must run before state bookkeeping so a concurrent reader
        // never observes a cooled-down role whose session is still alive.
        self.coordinator.supervisor().sessions().kill(id.as_str()).await?;
        self.state_store.update_state(|state| {
            state.health_for(role).record_force_kill(now);
            state.record_death(now);
        })?;
        self.record_health_history(role, "force_kill")?;
        Ok(())
    }

    /// Step 4: wakes the next queued task for an idle role, or resumes a
    /// suspended one using its stored session id first (spec §4.6 step 4
    /// "Suspended specialists with queued work are resumed first").
    async fn drain_queue(&self, role: SpecialistRole, report: &mut PatrolReport) -> Result<(), FleetError> {
        use fleet_core::specialist::SpecialistState;
        let state = self.coordinator.state(role).await?;
        if state != SpecialistState::Idle && state != SpecialistState::Suspended {
            return Ok(());
        }
        let Some(next) = self.coordinator.next_task(role)? else {
            return Ok(());
        };
        let prompt = format!("Resuming queued task for {}", next.payload.issue_id);
        let outcome = if state == SpecialistState::Suspended {
            self.coordinator.resume(role, &prompt).await
        } else {
            let task = crate::specialist::SpecialistTask {
                issue_id: next.payload.issue_id.clone(),
                prompt,
                priority: next.priority,
                source: next.source.clone(),
                branch: next.payload.branch.clone(),
                workspace: next.payload.workspace.clone(),
                pr_url: next.payload.pr_url.clone(),
            };
            self.coordinator.wake_specialist(role, &task).await
        };
        match outcome {
            Ok(()) => {
                self.coordinator.complete_task(role, &next.id, "woken")?;
                report.drained.push(role);
                if state == SpecialistState::Suspended {
                    self.record_health_history(role, "auto_restart")?;
                }
            }
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "drain wake failed, leaving task queued");
            }
        }
        Ok(())
    }

    /// Step 5: auto-suspends work agents (and specialists) idle past their
    /// per-class threshold, preserving `sessionId` for later resume.
    async fn suspend_idle_work_agents(&self, config: &DeaconConfig, report: &mut PatrolReport) -> Result<(), FleetError> {
        let now = self.clock.now_ms();
        for agent in self.coordinator.supervisor().list().await? {
            if !agent.tmux_active {
                continue;
            }
            let Some(runtime) = self.coordinator.supervisor().store().read_runtime(&agent.spec.id) else {
                continue;
            };
            if runtime.state != AgentState::Idle {
                continue;
            }
            let threshold = if agent.spec.id.as_specialist_role().is_some() {
                config.specialist_idle_ms
            } else {
                config.work_agent_idle_ms
            };
            if now - runtime.last_activity < threshold {
                continue;
            }
            self.coordinator.supervisor().sessions().kill(agent.spec.id.as_str()).await?;
            let suspended = AgentRuntimeState {
                state: AgentState::Suspended,
                last_activity: runtime.last_activity,
                suspended_at: Some(now),
                session_id: agent.spec.session_id.clone().or(runtime.session_id),
            };
            self.coordinator.supervisor().store().write_runtime(&agent.spec.id, &suspended)?;
            self.state_store.append_health_history(&HealthHistoryEntry {
                at_ms: now,
                specialist_name: agent.spec.id.as_str().to_string(),
                event: "auto_suspend".to_string(),
            })?;
            report.suspended.push(agent.spec.id);
        }
        Ok(())
    }

    /// Step 6: prunes `recentDeaths` and emits a mass-death alert if the
    /// threshold is met and the alert is not itself on cooldown.
    fn check_mass_death(&self, config: &DeaconConfig, report: &mut PatrolReport) -> Result<(), FleetError> {
        let now = self.clock.now_ms();
        let state = self.state_store.update_state(|state| {
            state.prune_recent_deaths(now, config.mass_death_window_ms);
            if state.should_alert_mass_death(now, config.mass_death_threshold, config.mass_death_alert_cooldown_ms) {
                state.last_mass_death_alert = Some(now);
            }
        })?;
        if state.last_mass_death_alert == Some(now) {
            tracing::warn!(
                deaths = state.recent_deaths.len(),
                "ALERT: mass-death threshold reached ({} deaths in window)",
                state.recent_deaths.len()
            );
            report.mass_death_alert = true;
            self.state_store.append_health_history(&HealthHistoryEntry {
                at_ms: now,
                specialist_name: "fleet".to_string(),
                event: "mass_death_alert".to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "deacon_tests.rs"]
mod tests;
