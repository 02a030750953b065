// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete end-to-end scenarios exercising the full fleet-engine stack
//! against `FakeDriver`/`FakeClock`, one per scenario in the control
//! plane's testable-properties section.

use std::collections::HashMap;

use fleet_core::hook::Priority;
use fleet_core::{
    AgentId, AgentRuntimeState, AgentStatus, DeaconConfig, FakeClock, Heartbeat,
    HookItem, HookItemType, RuntimeKind, SequentialIdGen, SpecialistRole,
};
use fleet_engine::deacon::RoleBootstrap;
use fleet_engine::specialist::{SpecialistBootstrap, SpecialistTask};
use fleet_engine::{AgentSupervisor, Deacon, HandoffManager, SpawnOptions, SpecialistCoordinator};
use fleet_session::FakeDriver;
use fleet_store::{AgentStore, DeaconStateStore, FleetPaths, HeartbeatStore, Hook, SpecialistQueueStore};
use tempfile::TempDir;

type Sup = AgentSupervisor<FakeDriver, FakeClock, SequentialIdGen>;
type Coord = SpecialistCoordinator<FakeDriver, FakeClock, SequentialIdGen>;
type TestDeacon = Deacon<FakeDriver, FakeClock, SequentialIdGen>;

fn harness(prefix: &str) -> (TempDir, FleetPaths, FakeClock, Sup) {
    let dir = tempfile::tempdir().unwrap();
    let paths = FleetPaths::new(dir.path());
    let clock = FakeClock::new(1_000);
    let store = AgentStore::new(paths.clone());
    let sup = AgentSupervisor::new(store, FakeDriver::new(), clock.clone(), SequentialIdGen::new(prefix));
    (dir, paths, clock, sup)
}

fn coordinator(prefix: &str) -> (TempDir, FleetPaths, FakeClock, Coord) {
    let (dir, paths, clock, sup) = harness(prefix);
    let queue = SpecialistQueueStore::new(paths.clone());
    (dir, paths, clock.clone(), SpecialistCoordinator::new(sup, queue, clock))
}

fn bootstrap() -> SpecialistBootstrap {
    SpecialistBootstrap {
        runtime: RuntimeKind::Claude,
        model: "opus".into(),
        workspace: "/work".into(),
    }
}

fn review_task(issue_id: &str) -> SpecialistTask {
    SpecialistTask {
        issue_id: issue_id.into(),
        prompt: format!("Review PR for {issue_id}"),
        priority: Priority::Normal,
        source: "work-agent".into(),
        branch: Some("feat".into()),
        workspace: Some("/w".into()),
        pr_url: Some("u".into()),
    }
}

fn spawn_opts(issue_id: &str) -> SpawnOptions {
    SpawnOptions {
        issue_id: issue_id.into(),
        workspace: "/work".into(),
        runtime: RuntimeKind::Claude,
        model: "sonnet".into(),
        prompt: Some("start".into()),
        phase: None,
        work_type: None,
    }
}

/// S1 — Happy-path specialist review.
#[tokio::test]
async fn s1_happy_path_specialist_review() {
    let (_dir, _paths, _clock, coord) = coordinator("s1");
    let role = SpecialistRole::Review;
    coord.initialize(role, bootstrap(), "you are the review agent".into()).await.unwrap();

    let task = review_task("MIN-42");
    coord.wake_specialist(role, &task).await.unwrap();

    let id = AgentId::for_specialist(role);
    let record = coord.supervisor().sessions().get(id.as_str()).unwrap();
    similar_asserts::assert_eq!(record.sent.last().unwrap(), &task.prompt);

    let outcome = coord
        .handle_review_output("MIN-42", "REVIEW_RESULT: APPROVED\n")
        .await
        .unwrap();
    assert!(outcome.approved, "approval needs no corrective feedback to the work agent");
    assert!(outcome.feedback.is_none());
    assert_eq!(coord.queue_stats(role).unwrap().depth, 0, "nothing was ever queued for a direct wake");
}

/// S2 — Busy coordinator queues.
#[tokio::test]
async fn s2_busy_coordinator_queues() {
    let (_dir, _paths, clock, coord) = coordinator("s2");
    let role = SpecialistRole::Merge;
    coord.initialize(role, bootstrap(), "you are the merge agent".into()).await.unwrap();

    let id = AgentId::for_specialist(role);
    coord
        .supervisor()
        .store()
        .write_runtime(&id, &AgentRuntimeState::active(clock.now_ms()))
        .unwrap();

    coord
        .wake_specialist_or_queue(role, review_task("MIN-1"), bootstrap(), "hello".into())
        .await
        .unwrap();
    clock.advance(10);
    coord
        .wake_specialist_or_queue(role, review_task("MIN-2"), bootstrap(), "hello".into())
        .await
        .unwrap();

    let stats = coord.queue_stats(role).unwrap();
    assert_eq!(stats.depth, 2);

    let record = coord.supervisor().sessions().get(id.as_str()).unwrap();
    assert!(record.sent.is_empty(), "no wake should be issued while active");

    let first = coord.next_task(role).unwrap().unwrap();
    assert_eq!(first.payload.issue_id, "MIN-1", "order observed matches arrival");
}

/// S3 — Stuck specialist force-kill cycle.
#[tokio::test]
async fn s3_stuck_specialist_force_kill_cycle() {
    let (_dir, paths, clock, sup) = harness("s3");
    let role = SpecialistRole::Review;
    let id = AgentId::for_specialist(role);
    let queue = SpecialistQueueStore::new(paths.clone());
    let coordinator = SpecialistCoordinator::new(sup, queue, clock.clone());
    let state_store = DeaconStateStore::new(paths.clone());
    let heartbeats = HeartbeatStore::new(paths.clone());
    let bootstraps: HashMap<_, _> = SpecialistRole::ALL
        .into_iter()
        .map(|r| {
            (
                r,
                RoleBootstrap {
                    bootstrap: bootstrap(),
                    prompt: format!("bootstrap {r}"),
                },
            )
        })
        .collect();
    let deacon: TestDeacon = Deacon::new(coordinator, state_store, heartbeats, clock.clone(), bootstraps);

    // Separate handles onto the same on-disk state, since `Deacon` owns its
    // collaborators outright — mirrors a second process reading the same
    // control-plane root.
    let heartbeats_view = HeartbeatStore::new(paths.clone());
    let state_view = DeaconStateStore::new(paths);

    let config = DeaconConfig {
        ping_timeout_ms: 1_000,
        consecutive_failures: 3,
        cooldown_ms: 300_000,
        ..DeaconConfig::default()
    };

    deacon.patrol_once(&config).await.unwrap();
    heartbeats_view
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

    let state = state_view.read_state();
    assert_eq!(state.specialists[role.as_str()].force_kill_count, 1);

    clock.advance(1_000);
    let report2 = deacon.patrol_once(&config).await.unwrap();
    assert!(!report2.force_killed.contains(&role), "second kill within cooldown is refused");
}

/// S4 — Crash recovery preserves hook.
#[tokio::test]
async fn s4_crash_recovery_preserves_hook() {
    let (_dir, paths, clock, sup) = harness("s4");
    let spec = sup.spawn(spawn_opts("MIN-7")).await.unwrap();

    let hook = Hook::new(paths.clone(), clock.clone(), SequentialIdGen::new("s4-hook"));
    hook.push(
        &spec.id,
        HookItem {
            id: String::new(),
            item_type: HookItemType::Task,
            priority: Priority::Normal,
            source: "cli".into(),
            payload: Default::default(),
            created_at: 0,
            expires_at: None,
        },
    )
    .unwrap();

    sup.sessions().simulate_external_death(spec.id.as_str());
    let results = sup.auto_recover_all().await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].1.is_ok());

    assert!(sup.sessions().exists(spec.id.as_str()).await.unwrap());
    let record = sup.sessions().get(spec.id.as_str()).unwrap();
    assert!(record.cmd.contains("Pending Work Items (1)"));
    assert!(hook.check(&spec.id).unwrap().has_work);
}

/// S5 — Handoff kill-and-spawn.
#[tokio::test]
async fn s5_handoff_kill_and_spawn() {
    let (_dir, _paths, clock, sup) = harness("s5");
    let spec = sup.spawn(spawn_opts("MIN-9")).await.unwrap();

    let manager = HandoffManager::new(clock.clone());
    let outcome = manager
        .handoff(&sup, None, &spec.id, "X", "stuck", None, 0, None)
        .await
        .unwrap();
    assert_eq!(outcome.mode_used, fleet_core::HandoffMode::KillAndSpawn);

    let new_spec = sup.store().read_state(&spec.id).unwrap();
    assert_eq!(new_spec.id, spec.id);
    assert_eq!(new_spec.model, "X");
    assert_eq!(new_spec.handoff_count, 1);
    assert!(sup.sessions().exists(spec.id.as_str()).await.unwrap());
    assert_eq!(new_spec.status, AgentStatus::Running);
    assert!(outcome.handoff_path.exists());
    assert!(outcome.handoff_path.file_name().unwrap().to_string_lossy().starts_with("handoff-"));
}

/// S6 — Mass-death alert.
#[tokio::test]
async fn s6_mass_death_alert() {
    let (_dir, paths, clock, sup) = harness("s6");
    let queue = SpecialistQueueStore::new(paths.clone());
    let coordinator = SpecialistCoordinator::new(sup, queue, clock.clone());
    let state_store = DeaconStateStore::new(paths.clone());
    let heartbeats = HeartbeatStore::new(paths.clone());
    let bootstraps: HashMap<_, _> = SpecialistRole::ALL
        .into_iter()
        .map(|r| (r, RoleBootstrap { bootstrap: bootstrap(), prompt: format!("bootstrap {r}") }))
        .collect();
    let deacon: TestDeacon = Deacon::new(coordinator, state_store, heartbeats, clock.clone(), bootstraps);
    let state_view = DeaconStateStore::new(paths);
    let config = DeaconConfig::default();

    state_view
        .update_state(|s| {
            s.record_death(clock.now_ms());
            s.record_death(clock.now_ms());
        })
        .unwrap();

    let report = deacon.patrol_once(&config).await.unwrap();
    assert!(report.mass_death_alert);
    let state = state_view.read_state();
    assert!(state.last_mass_death_alert.unwrap() >= clock.now_ms() - 60_000);

    clock.advance(1_000);
    let report2 = deacon.patrol_once(&config).await.unwrap();
    assert!(!report2.mass_death_alert, "third kill within cooldown does not re-alert");
}
