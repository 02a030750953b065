// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deacon health-tracking state, per spec §3 `SpecialistHealthState`,
//! `DeaconState`, and §6 `deacon/config.json`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::specialist::SpecialistRole;

/// Per-role health counters, held inside `deacon/health-state.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistHealthState {
    pub specialist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ping_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_response_time: Option<i64>,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_force_kill_time: Option<i64>,
    #[serde(default)]
    pub force_kill_count: u32,
}

impl SpecialistHealthState {
    pub fn new(role: SpecialistRole) -> Self {
        Self {
            specialist_name: role.as_str().to_string(),
            last_ping_time: None,
            last_response_time: None,
            consecutive_failures: 0,
            last_force_kill_time: None,
            force_kill_count: 0,
        }
    }

    /// Resets on a successful ping or a force-kill (spec §3 invariant).
    pub fn reset_failures(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn record_force_kill(&mut self, now_ms: i64) {
        self.last_force_kill_time = Some(now_ms);
        self.force_kill_count += 1;
        self.reset_failures();
    }

    pub fn in_cooldown(&self, now_ms: i64, cooldown_ms: i64) -> bool {
        match self.last_force_kill_time {
            Some(t) => now_ms - t < cooldown_ms,
            None => false,
        }
    }

    pub fn cooldown_remaining_ms(&self, now_ms: i64, cooldown_ms: i64) -> i64 {
        match self.last_force_kill_time {
            Some(t) => (cooldown_ms - (now_ms - t)).max(0),
            None => 0,
        }
    }
}

/// Outer persisted state for the Deacon, `deacon/health-state.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeaconState {
    #[serde(default)]
    pub specialists: HashMap<String, SpecialistHealthState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_patrol: Option<i64>,
    #[serde(default)]
    pub patrol_cycle: u64,
    /// Sliding list of ISO-ish millis timestamps within the mass-death window.
    #[serde(default)]
    pub recent_deaths: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_mass_death_alert: Option<i64>,
}

impl DeaconState {
    pub fn health_for(&mut self, role: SpecialistRole) -> &mut SpecialistHealthState {
        self.specialists
            .entry(role.as_str().to_string())
            .or_insert_with(|| SpecialistHealthState::new(role))
    }

    /// Prunes `recent_deaths` to entries within `window_ms` of `now_ms`,
    /// per spec §4.6 step 6.
    pub fn prune_recent_deaths(&mut self, now_ms: i64, window_ms: i64) {
        self.recent_deaths.retain(|t| now_ms - *t <= window_ms);
    }

    pub fn record_death(&mut self, now_ms: i64) {
        self.recent_deaths.push(now_ms);
    }

    /// `true` if a mass-death alert should fire: at least `threshold` deaths
    /// in the window and no alert within the last `alert_cooldown_ms`.
    pub fn should_alert_mass_death(
        &self,
        now_ms: i64,
        threshold: usize,
        alert_cooldown_ms: i64,
    ) -> bool {
        if self.recent_deaths.len() < threshold {
            return false;
        }
        match self.last_mass_death_alert {
            Some(t) => now_ms - t >= alert_cooldown_ms,
            None => true,
        }
    }
}

/// `deacon/config.json` merged over defaults, per spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeaconConfig {
    pub ping_timeout_ms: i64,
    pub consecutive_failures: u32,
    pub cooldown_ms: i64,
    pub patrol_interval_ms: u64,
    pub mass_death_threshold: usize,
    pub mass_death_window_ms: i64,
    /// Work-agent idle threshold before auto-suspend (process-level config,
    /// separate from the Deacon's own `deacon/config.json` per spec §6, but
    /// merged here for convenience).
    pub work_agent_idle_ms: i64,
    pub specialist_idle_ms: i64,
    /// Window within which a repeated mass-death alert is suppressed.
    pub mass_death_alert_cooldown_ms: i64,
}

impl Default for DeaconConfig {
    fn default() -> Self {
        Self {
            ping_timeout_ms: 30_000,
            consecutive_failures: 3,
            cooldown_ms: 300_000,
            patrol_interval_ms: 30_000,
            mass_death_threshold: 2,
            mass_death_window_ms: 60_000,
            work_agent_idle_ms: 10 * 60 * 1000,
            specialist_idle_ms: 5 * 60 * 1000,
            mass_death_alert_cooldown_ms: 5 * 60 * 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_kill_resets_failures_and_starts_cooldown() {
        let mut h = SpecialistHealthState::new(SpecialistRole::Review);
        h.consecutive_failures = 5;
        h.record_force_kill(1_000);
        assert_eq!(h.consecutive_failures, 0);
        assert_eq!(h.force_kill_count, 1);
        assert!(h.in_cooldown(1_000, 300_000));
        assert!(!h.in_cooldown(400_000, 300_000));
    }

    #[test]
    fn mass_death_alert_requires_threshold_and_respects_cooldown() {
        let mut s = DeaconState::default();
        s.record_death(0);
        assert!(!s.should_alert_mass_death(0, 2, 300_000));
        s.record_death(30_000);
        assert!(s.should_alert_mass_death(30_000, 2, 300_000));
        s.last_mass_death_alert = Some(30_000);
        assert!(!s.should_alert_mass_death(31_000, 2, 300_000));
        assert!(s.should_alert_mass_death(330_001, 2, 300_000));
    }

    #[test]
    fn prune_recent_deaths_drops_stale_entries() {
        let mut s = DeaconState::default();
        s.recent_deaths = vec![0, 30_000, 90_000];
        s.prune_recent_deaths(90_000, 60_000);
        assert_eq!(s.recent_deaths, vec![30_000, 90_000]);
    }

    #[test]
    fn default_config_matches_spec_defaults() {
        let c = DeaconConfig::default();
        assert_eq!(c.ping_timeout_ms, 30_000);
        assert_eq!(c.consecutive_failures, 3);
        assert_eq!(c.cooldown_ms, 300_000);
        assert_eq!(c.patrol_interval_ms, 30_000);
        assert_eq!(c.mass_death_threshold, 2);
        assert_eq!(c.mass_death_window_ms, 60_000);
    }
}
