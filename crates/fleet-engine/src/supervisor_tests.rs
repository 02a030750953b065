// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fleet_core::{FakeClock, SequentialIdGen};
use fleet_session::FakeDriver;
use fleet_store::FleetPaths;
use tempfile::tempdir;

fn supervisor() -> (tempfile::TempDir, AgentSupervisor<FakeDriver, FakeClock, SequentialIdGen>) {
    let dir = tempdir().unwrap();
    let store = AgentStore::new(FleetPaths::new(dir.path()));
    let sup = AgentSupervisor::new(
        store,
        FakeDriver::new(),
        FakeClock::new(1_000),
        SequentialIdGen::new("hook"),
    );
    (dir, sup)
}

fn opts(issue: &str) -> SpawnOptions {
    SpawnOptions {
        issue_id: issue.to_string(),
        workspace: "/work".to_string(),
        runtime: RuntimeKind::Claude,
        model: "opus".to_string(),
        prompt: Some("start".to_string()),
        phase: None,
        work_type: None,
    }
}

#[tokio::test]
async fn spawn_creates_a_running_agent() {
    let (_dir, sup) = supervisor();
    let spec = sup.spawn(opts("MIN-1")).await.unwrap();
    assert_eq!(spec.status, AgentStatus::Running);
    assert_eq!(spec.id.as_str(), "agent-min-1");
}

#[tokio::test]
async fn spawn_twice_is_already_running() {
    let (_dir, sup) = supervisor();
    sup.spawn(opts("MIN-1")).await.unwrap();
    let err = sup.spawn(opts("MIN-1")).await.unwrap_err();
    assert!(matches!(err, FleetError::AlreadyRunning(_)));
}

#[tokio::test]
async fn stop_on_absent_agent_is_a_noop() {
    let (_dir, sup) = supervisor();
    let id = AgentId::for_issue("GHOST-1");
    sup.stop(&id).await.unwrap();
}

#[tokio::test]
async fn detect_crashed_finds_agents_whose_session_died() {
    let (_dir, sup) = supervisor();
    let spec = sup.spawn(opts("MIN-1")).await.unwrap();
    sup.sessions.simulate_external_death(spec.id.as_str());
    let crashed = sup.detect_crashed().await.unwrap();
    assert_eq!(crashed, vec![spec.id]);
}

#[tokio::test]
async fn recover_respawns_with_same_id_and_increments_recovery_count() {
    let (_dir, sup) = supervisor();
    let spec = sup.spawn(opts("MIN-1")).await.unwrap();
    sup.sessions.simulate_external_death(spec.id.as_str());
    let recovered = sup.recover(&spec.id).await.unwrap();
    assert_eq!(recovered.id, spec.id);
    assert_eq!(recovered.recovery_count, 1);
    assert!(sup.sessions.exists(spec.id.as_str()).await.unwrap());
}

#[tokio::test]
async fn resume_respawns_with_the_resume_flag_and_stored_session_id() {
    let (_dir, sup) = supervisor();
    let spec = sup.spawn(opts("MIN-1")).await.unwrap();
    sup.sessions.simulate_external_death(spec.id.as_str());
    let resumed = sup.resume(&spec.id, "sess-123", "pick up where you left off").await.unwrap();
    assert_eq!(resumed.session_id.as_deref(), Some("sess-123"));
    let record = sup.sessions.get(spec.id.as_str()).unwrap();
    assert!(record.cmd.contains("--resume sess-123"));
}

#[tokio::test]
async fn resume_refuses_when_a_session_is_already_alive() {
    let (_dir, sup) = supervisor();
    let spec = sup.spawn(opts("MIN-1")).await.unwrap();
    let err = sup.resume(&spec.id, "sess-123", "hi").await.unwrap_err();
    assert!(matches!(err, FleetError::AlreadyRunning(_)));
}

#[tokio::test]
async fn auto_recover_all_recovers_every_crashed_agent() {
    let (_dir, sup) = supervisor();
    let a = sup.spawn(opts("MIN-1")).await.unwrap();
    let b = sup.spawn(opts("MIN-2")).await.unwrap();
    sup.sessions.simulate_external_death(a.id.as_str());
    sup.sessions.simulate_external_death(b.id.as_str());
    let results = sup.auto_recover_all().await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
}

#[tokio::test]
async fn crash_recovery_preserves_the_hook_and_renders_startup_prompt() {
    let (_dir, sup) = supervisor();
    let spec = sup.spawn(opts("MIN-1")).await.unwrap();
    sup.hook()
        .push(
            &spec.id,
            fleet_core::HookItem {
                id: String::new(),
                item_type: fleet_core::HookItemType::Task,
                priority: Priority::Normal,
                source: "cli".into(),
                payload: Default::default(),
                created_at: 0,
                expires_at: None,
            },
        )
        .unwrap();
    sup.sessions.simulate_external_death(spec.id.as_str());
    sup.recover(&spec.id).await.unwrap();

    let record = sup.sessions.get(spec.id.as_str()).unwrap();
    assert!(record.cmd.contains("Pending Work Items (1)"));
    assert!(sup.hook().check(&spec.id).unwrap().has_work);
}
