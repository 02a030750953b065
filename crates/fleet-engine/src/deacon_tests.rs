// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fleet_core::{FakeClock, Heartbeat, RuntimeKind, SequentialIdGen};
use fleet_session::FakeDriver;
use fleet_store::{AgentStore, FleetPaths, SpecialistQueueStore};
use tempfile::tempdir;

fn bootstraps() -> HashMap<SpecialistRole, RoleBootstrap> {
    SpecialistRole::ALL
        .into_iter()
        .map(|role| {
            (
                role,
                RoleBootstrap {
                    bootstrap: SpecialistBootstrap {
                        runtime: RuntimeKind::Claude,
                        model: "opus".into(),
                        workspace: "/work".into(),
                    },
                    prompt: format!("bootstrap {role}"),
                },
            )
        })
        .collect()
}

fn deacon() -> (
    tempfile::TempDir,
    Deacon<FakeDriver, FakeClock, SequentialIdGen>,
    FakeClock,
) {
    let dir = tempdir().unwrap();
    let paths = FleetPaths::new(dir.path());
    let clock = FakeClock::new(1_000);
    let store = AgentStore::new(paths.clone());
    let supervisor = fleet_engine_test_support_supervisor(store, clock.clone());
    let queue = SpecialistQueueStore::new(paths.clone());
    let coordinator = SpecialistCoordinator::new(supervisor, queue, clock.clone());
    let state_store = DeaconStateStore::new(paths.clone());
    let heartbeats = HeartbeatStore::new(paths);
    let deacon = Deacon::new(coordinator, state_store, heartbeats, clock.clone(), bootstraps());
    (dir, deacon, clock)
}

fn fleet_engine_test_support_supervisor(
    store: AgentStore,
    clock: FakeClock,
) -> crate::supervisor::AgentSupervisor<FakeDriver, FakeClock, SequentialIdGen> {
    crate::supervisor::AgentSupervisor::new(store, FakeDriver::new(), clock, SequentialIdGen::new("deacon"))
}

#[tokio::test]
async fn patrol_auto_initializes_a_role_that_is_not_running() {
    let (_dir, deacon, _clock) = deacon();
    let config = DeaconConfig::default();
    let report = deacon.patrol_once(&config).await.unwrap();
    assert_eq!(report.initialized.len(), SpecialistRole::ALL.len());
}

#[tokio::test]
async fn patrol_on_zero_enabled_specialists_still_prunes_deaths() {
    // Even with the full role set, an empty recent_deaths list stays
    // empty and the tick still completes (spec §8 boundary behavior).
    let (_dir, deacon, _clock) = deacon();
    let config = DeaconConfig::default();
    deacon.patrol_once(&config).await.unwrap();
    let state = deacon.state_store.read_state();
    assert!(state.recent_deaths.is_empty());
}

#[tokio::test]
async fn three_stale_ticks_force_kill_and_restart_with_cooldown() {
    let (_dir, deacon, clock) = deacon();
    let config = DeaconConfig {
        ping_timeout_ms: 1_000,
        consecutive_failures: 3,
        cooldown_ms: 300_000,
        ..DeaconConfig::default()
    };
    let role = SpecialistRole::Review;
    let id = AgentId::for_specialist(role);

    // First tick initializes the role (session created, no heartbeat yet).
    deacon.patrol_once(&config).await.unwrap();
    assert!(deacon.coordinator.supervisor().sessions().exists(id.as_str()).await.unwrap());

    // Heartbeat is stale on every subsequent tick.
    deacon
        .heartbeats
        .write(
            id.as_str(),
            &Heartbeat {
                timestamp: 0,
                agent_id: id.as_str().to_string(),
                tool_name: None,
                last_action: None,
                current_task: None,
                git_branch: None,
                workspace: None,
                pid: None,
                session_id: None,
            },
        )
        .unwrap();

    clock.advance(2_000);
    deacon.patrol_once(&config).await.unwrap();
    clock.advance(2_000);
    deacon.patrol_once(&config).await.unwrap();
    clock.advance(2_000);
    let report = deacon.patrol_once(&config).await.unwrap();
    assert!(report.force_killed.contains(&role));

    let state = deacon.state_store.read_state();
    assert_eq!(state.specialists[role.as_str()].force_kill_count, 1);

    // Second force-kill attempt within cooldown is refused.
    clock.advance(1_000);
    deacon
        .heartbeats
        .write(
            id.as_str(),
            &Heartbeat {
                timestamp: 0,
                agent_id: id.as_str().to_string(),
                tool_name: None,
                last_action: None,
                current_task: None,
                git_branch: None,
                workspace: None,
                pid: None,
                session_id: None,
            },
        )
        .unwrap();
    let report2 = deacon.patrol_once(&config).await.unwrap();
    assert!(!report2.force_killed.contains(&role));
}

#[tokio::test]
async fn mass_death_alert_fires_after_two_kills_in_window() {
    let (_dir, deacon, clock) = deacon();
    deacon
        .state_store
        .update_state(|s| {
            s.record_death(clock.now_ms());
            s.record_death(clock.now_ms());
        })
        .unwrap();
    let config = DeaconConfig::default();
    let report = deacon.patrol_once(&config).await.unwrap();
    assert!(report.mass_death_alert);

    clock.advance(1_000);
    let report2 = deacon.patrol_once(&config).await.unwrap();
    assert!(!report2.mass_death_alert);
}
