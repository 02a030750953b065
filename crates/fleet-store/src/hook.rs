// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work Hook: the prioritized durable queue attached to an agent
//! (spec §3 `Hook`, §4.2).

use fleet_core::{AgentId, Clock, HookItem, IdGen};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::atomic::{read_json_opt, write_json_atomic, FileLock};
use crate::error::StoreError;
use crate::mailbox::Mailbox;
use crate::paths::FleetPaths;

/// On-disk shape of `agents/<id>/hook.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HookFile {
    #[serde(default)]
    items: Vec<HookItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_checked: Option<i64>,
}

/// Result of `check`, per spec §4.2.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub has_work: bool,
    pub urgent_count: usize,
    pub items: Vec<HookItem>,
}

/// The fixed-point work hook, generic over `Clock`/`IdGen` so tests can
/// control timestamps and ids.
pub struct Hook<C: Clock, I: IdGen> {
    paths: FleetPaths,
    clock: C,
    id_gen: I,
}

impl<C: Clock, I: IdGen> Hook<C, I> {
    pub fn new(paths: FleetPaths, clock: C, id_gen: I) -> Self {
        Self {
            paths,
            clock,
            id_gen,
        }
    }

    /// Creates `agents/<id>/` and an empty `hook.json` and `mail/`
    /// idempotently.
    pub fn init(&self, id: &AgentId) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.paths.agent_dir(id.as_str()))?;
        std::fs::create_dir_all(self.paths.mail_dir(id.as_str()))?;
        let path = self.paths.hook_path(id.as_str());
        if !path.exists() {
            let _lock = FileLock::acquire(&self.paths.hook_lock_path(id.as_str()))?;
            if !path.exists() {
                write_json_atomic(&path, &HookFile::default())?;
            }
        }
        Ok(())
    }

    fn load(&self, id: &AgentId) -> HookFile {
        read_json_opt(&self.paths.hook_path(id.as_str())).unwrap_or_default()
    }

    fn save(&self, id: &AgentId, file: &HookFile) -> Result<(), StoreError> {
        write_json_atomic(&self.paths.hook_path(id.as_str()), file)
    }

    /// Appends a `HookItem` with a generated id and timestamp.
    ///
    /// `item` should have `id` left empty and `created_at` left at 0 —
    /// both are assigned here so callers never race on id generation.
    pub fn push(&self, id: &AgentId, mut item: HookItem) -> Result<HookItem, StoreError> {
        self.init(id)?;
        let _lock = FileLock::acquire(&self.paths.hook_lock_path(id.as_str()))?;
        let mut file = self.load(id);
        if item.id.is_empty() {
            item.id = self.id_gen.next();
        }
        if item.created_at == 0 {
            item.created_at = self.clock.now_ms();
        }
        file.items.push(item.clone());
        self.save(id, &file)?;
        Ok(item)
    }

    /// Merges hook + mailbox contents, drops expired items, sorts by
    /// (priority, arrival) ascending. Readers do not consume items.
    pub fn check(&self, id: &AgentId) -> Result<CheckResult, StoreError> {
        let now = self.clock.now_ms();
        let _lock = FileLock::acquire(&self.paths.hook_lock_path(id.as_str()))?;
        let mut file = self.load(id);

        let before = file.items.len();
        file.items.retain(|item| !item.is_expired(now));
        // Reap expired items on next write, per spec §3 invariant.
        if file.items.len() != before {
            self.save(id, &file)?;
        }

        let mailbox = Mailbox::new(self.paths.clone());
        let mail_items = mailbox.peek(id)?;

        let mut items: Vec<HookItem> = file.items;
        items.extend(mail_items.into_iter().filter(|m| !m.is_expired(now)));
        items.sort_by_key(|item| item.ordering_key());

        let urgent_count = items
            .iter()
            .filter(|item| item.priority == fleet_core::hook::Priority::Urgent)
            .count();

        Ok(CheckResult {
            has_work: !items.is_empty(),
            urgent_count,
            items,
        })
    }

    /// Removes the identified item from the hook (not the mailbox — mailbox
    /// items are consumed only via `collect_mail`). Returns whether it was
    /// present.
    pub fn pop(&self, id: &AgentId, item_id: &str) -> Result<bool, StoreError> {
        let _lock = FileLock::acquire(&self.paths.hook_lock_path(id.as_str()))?;
        let mut file = self.load(id);
        let before = file.items.len();
        file.items.retain(|item| item.id != item_id);
        let removed = file.items.len() != before;
        file.last_checked = Some(self.clock.now_ms());
        self.save(id, &file)?;
        Ok(removed)
    }

    /// Empties the queue (mailbox is untouched).
    pub fn clear(&self, id: &AgentId) -> Result<(), StoreError> {
        let _lock = FileLock::acquire(&self.paths.hook_lock_path(id.as_str()))?;
        self.save(id, &HookFile::default())?;
        Ok(())
    }

    /// Replaces the queue order with the given permutation. Fails if the set
    /// of ids does not exactly match the current set.
    pub fn reorder(&self, id: &AgentId, ordered_ids: &[String]) -> Result<(), StoreError> {
        let _lock = FileLock::acquire(&self.paths.hook_lock_path(id.as_str()))?;
        let mut file = self.load(id);

        let current: HashSet<&str> = file.items.iter().map(|i| i.id.as_str()).collect();
        let requested: HashSet<&str> = ordered_ids.iter().map(|s| s.as_str()).collect();
        if current != requested {
            return Err(StoreError::ReorderMismatch);
        }

        let mut by_id: std::collections::HashMap<String, HookItem> = file
            .items
            .drain(..)
            .map(|item| (item.id.clone(), item))
            .collect();
        file.items = ordered_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        self.save(id, &file)?;
        Ok(())
    }

    /// Renders a fixed-form Markdown summary used as the initial prompt for
    /// a fresh or recovering agent, per spec §4.2.
    pub fn generate_startup_prompt(&self, id: &AgentId) -> Result<Option<String>, StoreError> {
        let result = self.check(id)?;
        if result.items.is_empty() {
            return Ok(None);
        }
        let mut out = format!("## Pending Work Items ({})\n\n", result.items.len());
        for item in &result.items {
            out.push_str(&format!(
                "- [{}] ({}) from {}\n",
                item.priority, item.item_type_label(), item.source
            ));
        }
        out.push_str("\nPending Work Items: address these before taking on new work.\n");
        Ok(Some(out))
    }
}

impl HookItem {
    fn item_type_label(&self) -> &'static str {
        match self.item_type {
            fleet_core::hook::HookItemType::Task => "task",
            fleet_core::hook::HookItemType::Message => "message",
            fleet_core::hook::HookItemType::Notification => "notification",
        }
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
