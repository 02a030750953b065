// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-role specialist queue, wake log, history, and resume-token storage
//! (spec §3 `SpecialistQueue`, §4.4).

use fleet_core::{SpecialistQueueItem, SpecialistRole};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};

use crate::atomic::{write_json_atomic, FileLock};
use crate::error::StoreError;
use crate::paths::FleetPaths;

/// Reads and mutates `specialists/<role>/queue.jsonl`, and appends to the
/// adjacent `wake-log.jsonl`/`history.jsonl` append-only logs.
#[derive(Clone)]
pub struct SpecialistQueueStore {
    paths: FleetPaths,
}

impl SpecialistQueueStore {
    pub fn new(paths: FleetPaths) -> Self {
        Self { paths }
    }

    fn lock_path(&self, role: SpecialistRole) -> std::path::PathBuf {
        self.paths
            .specialist_dir(role.as_str())
            .join(".queue.lock")
    }

    /// Appends a task to the tail of the queue. Arrival order within the
    /// same priority band is the file's append order (spec §8 property 9).
    pub fn push(&self, role: SpecialistRole, item: &SpecialistQueueItem) -> Result<(), StoreError> {
        fs::create_dir_all(self.paths.specialist_dir(role.as_str()))?;
        let _lock = FileLock::acquire(&self.lock_path(role))?;
        append_jsonl(&self.paths.specialist_queue_path(role.as_str()), item)
    }

    /// Every queued item in file order (not yet priority-sorted).
    pub fn list(&self, role: SpecialistRole) -> Result<Vec<SpecialistQueueItem>, StoreError> {
        read_jsonl(&self.paths.specialist_queue_path(role.as_str()))
    }

    /// Highest-priority, earliest-arrived item, stable against ties. Returns
    /// `None` if the queue is empty. Does not remove it — see `remove`.
    pub fn peek_next(&self, role: SpecialistRole) -> Result<Option<SpecialistQueueItem>, StoreError> {
        let mut items = self.list(role)?;
        if items.is_empty() {
            return Ok(None);
        }
        items.sort_by_key(|item| (item.priority, item.created_at));
        Ok(Some(items.remove(0)))
    }

    /// Removes one item by id, rewriting the file without it. Used after a
    /// specialist has picked up `peek_next`'s result.
    pub fn remove(&self, role: SpecialistRole, item_id: &str) -> Result<bool, StoreError> {
        let _lock = FileLock::acquire(&self.lock_path(role))?;
        let path = self.paths.specialist_queue_path(role.as_str());
        let mut items = read_jsonl::<SpecialistQueueItem>(&path)?;
        let before = items.len();
        items.retain(|item| item.id != item_id);
        let removed = items.len() != before;
        rewrite_jsonl(&path, &items)?;
        Ok(removed)
    }

    /// Appends a wake-event record (spec §4.4: "every wake is durably
    /// logged before the specialist is sent a prompt").
    pub fn log_wake(&self, role: SpecialistRole, record: &WakeRecord) -> Result<(), StoreError> {
        fs::create_dir_all(self.paths.specialist_dir(role.as_str()))?;
        append_jsonl(&self.paths.specialist_wake_log_path(role.as_str()), record)
    }

    /// Appends a completed-task record.
    pub fn log_history(&self, role: SpecialistRole, record: &HistoryRecord) -> Result<(), StoreError> {
        fs::create_dir_all(self.paths.specialist_dir(role.as_str()))?;
        append_jsonl(&self.paths.specialist_history_path(role.as_str()), record)
    }

    /// Persists the tmux/runtime session id used to resume a specialist
    /// across wakes (spec §4.4: specialists are woken, not respawned).
    pub fn write_session_id(&self, role: SpecialistRole, session_id: &str) -> Result<(), StoreError> {
        fs::create_dir_all(self.paths.specialist_dir(role.as_str()))?;
        write_json_atomic(
            &self.paths.specialist_session_id_path(role.as_str()),
            &session_id.to_string(),
        )
    }

    pub fn read_session_id(&self, role: SpecialistRole) -> Option<String> {
        crate::atomic::read_json_opt(&self.paths.specialist_session_id_path(role.as_str()))
    }
}

/// One `wake-log.jsonl` entry.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct WakeRecord {
    pub at_ms: i64,
    pub item_id: String,
    pub reason: String,
}

/// One `history.jsonl` entry.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct HistoryRecord {
    pub at_ms: i64,
    pub item_id: String,
    pub outcome: String,
}

fn append_jsonl<T: Serialize>(path: &std::path::Path, value: &T) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(value)?;
    writeln!(file, "{line}")?;
    Ok(())
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(value) => out.push(value),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping malformed jsonl line"),
        }
    }
    Ok(out)
}

fn rewrite_jsonl<T: Serialize>(path: &std::path::Path, items: &[T]) -> Result<(), StoreError> {
    let tmp = path.with_extension("jsonl.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        for item in items {
            let line = serde_json::to_string(item)?;
            writeln!(file, "{line}")?;
        }
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::hook::Priority;
    use fleet_core::specialist::QueuedTaskPayload;
    use tempfile::tempdir;

    fn item(id: &str, priority: Priority, created_at: i64) -> SpecialistQueueItem {
        SpecialistQueueItem {
            id: id.to_string(),
            priority,
            source: "supervisor".into(),
            created_at,
            payload: QueuedTaskPayload {
                issue_id: "MIN-1".into(),
                branch: None,
                workspace: None,
                pr_url: None,
                context: Default::default(),
            },
        }
    }

    fn store() -> (tempfile::TempDir, SpecialistQueueStore) {
        let dir = tempdir().unwrap();
        (dir.path().into(), SpecialistQueueStore::new(FleetPaths::new(dir.path())))
    }

    #[test]
    fn push_then_list_preserves_arrival_order() {
        let (_dir, store) = store();
        let role = SpecialistRole::Review;
        store.push(role, &item("a", Priority::Normal, 1)).unwrap();
        store.push(role, &item("b", Priority::Normal, 2)).unwrap();
        let ids: Vec<_> = store.list(role).unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn peek_next_prefers_higher_priority_over_later_arrival() {
        let (_dir, store) = store();
        let role = SpecialistRole::Review;
        store.push(role, &item("a", Priority::Low, 1)).unwrap();
        store.push(role, &item("b", Priority::Urgent, 2)).unwrap();
        let next = store.peek_next(role).unwrap().unwrap();
        assert_eq!(next.id, "b");
    }

    #[test]
    fn remove_drops_exactly_one_item() {
        let (_dir, store) = store();
        let role = SpecialistRole::Review;
        store.push(role, &item("a", Priority::Normal, 1)).unwrap();
        store.push(role, &item("b", Priority::Normal, 2)).unwrap();
        assert!(store.remove(role, "a").unwrap());
        assert!(!store.remove(role, "a").unwrap());
        let ids: Vec<_> = store.list(role).unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn session_id_round_trips() {
        let (_dir, store) = store();
        let role = SpecialistRole::Merge;
        assert!(store.read_session_id(role).is_none());
        store.write_session_id(role, "fleet-merge-agent").unwrap();
        assert_eq!(store.read_session_id(role).unwrap(), "fleet-merge-agent");
    }

    #[test]
    fn wake_and_history_logs_append_without_truncating() {
        let (_dir, store) = store();
        let role = SpecialistRole::Test;
        store
            .log_wake(role, &WakeRecord { at_ms: 1, item_id: "a".into(), reason: "queued".into() })
            .unwrap();
        store
            .log_wake(role, &WakeRecord { at_ms: 2, item_id: "b".into(), reason: "queued".into() })
            .unwrap();
        let lines: Vec<WakeRecord> = read_jsonl(&store.paths.specialist_wake_log_path(role.as_str())).unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn malformed_queue_line_is_skipped_not_fatal() {
        let (_dir, store) = store();
        let role = SpecialistRole::Planning;
        let path = store.paths.specialist_queue_path(role.as_str());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json}\n").unwrap();
        assert!(store.list(role).unwrap().is_empty());
    }
}
