// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inter-agent mailbox: one file per message under `agents/<id>/mail/`
//! (spec §3, §4.2 `send_mail`/`collect_mail`).

use fleet_core::hook::{HookItemType, Priority};
use fleet_core::{AgentId, HookItem, IdGen, UuidIdGen};
use std::collections::HashMap;
use std::fs;

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::error::StoreError;
use crate::paths::FleetPaths;

/// Appends/consumes mail files under an agent's `mail/` directory.
///
/// Mail items are surfaced through `Hook::check` alongside `hook.json`
/// entries (spec §3: "check merges `hook.json` and `mail/`"), but only
/// `collect_mail` removes them from disk.
#[derive(Clone)]
pub struct Mailbox {
    paths: FleetPaths,
}

impl Mailbox {
    pub fn new(paths: FleetPaths) -> Self {
        Self { paths }
    }

    /// Writes one file per message; the filename is the message id so
    /// `collect_mail` and `peek` can both enumerate the directory directly.
    pub fn send_mail(
        &self,
        to: &AgentId,
        from: &str,
        message: &str,
        priority: Priority,
    ) -> Result<HookItem, StoreError> {
        fs::create_dir_all(self.paths.mail_dir(to.as_str()))?;
        let id = format!("mail-{}", UuidIdGen.next());
        let mut payload = HashMap::new();
        payload.insert("message".to_string(), serde_json::json!(message));
        let item = HookItem {
            id: id.clone(),
            item_type: HookItemType::Message,
            priority,
            source: from.to_string(),
            payload,
            created_at: now_ms(),
            expires_at: None,
        };
        let path = self.paths.mail_dir(to.as_str()).join(format!("{id}.json"));
        write_json_atomic(&path, &item)?;
        Ok(item)
    }

    /// Reads (without removing) every pending message, for merging into
    /// `Hook::check`.
    pub fn peek(&self, id: &AgentId) -> Result<Vec<HookItem>, StoreError> {
        let dir = self.paths.mail_dir(id.as_str());
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut items = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(item) = read_json_opt(&entry.path()) {
                    items.push(item);
                }
            }
        }
        Ok(items)
    }

    /// Atomically reads and removes every pending message for `id`.
    ///
    /// Each file is removed right after it is read; a message that arrives
    /// concurrently during collection is simply picked up on the next call.
    pub fn collect_mail(&self, id: &AgentId) -> Result<Vec<HookItem>, StoreError> {
        let dir = self.paths.mail_dir(id.as_str());
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut items = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(item) = read_json_opt::<HookItem>(&path) {
                    items.push(item);
                }
                let _ = fs::remove_file(&path);
            }
        }
        items.sort_by_key(|item| item.ordering_key());
        Ok(items)
    }
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn mailbox() -> (tempfile::TempDir, Mailbox) {
        let dir = tempdir().unwrap();
        let mailbox = Mailbox::new(FleetPaths::new(dir.path()));
        (dir, mailbox)
    }

    #[test]
    fn send_mail_then_peek_does_not_consume() {
        let (_dir, mailbox) = mailbox();
        let id = AgentId::for_issue("MIN-1");
        mailbox
            .send_mail(&id, "deacon", "hello", Priority::Normal)
            .unwrap();
        assert_eq!(mailbox.peek(&id).unwrap().len(), 1);
        assert_eq!(mailbox.peek(&id).unwrap().len(), 1);
    }

    #[test]
    fn collect_mail_drains_the_directory() {
        let (_dir, mailbox) = mailbox();
        let id = AgentId::for_issue("MIN-1");
        mailbox
            .send_mail(&id, "deacon", "hello", Priority::Normal)
            .unwrap();
        mailbox
            .send_mail(&id, "deacon", "world", Priority::Urgent)
            .unwrap();
        let collected = mailbox.collect_mail(&id).unwrap();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].priority, Priority::Urgent);
        assert!(mailbox.collect_mail(&id).unwrap().is_empty());
    }

    #[test]
    fn peek_on_missing_directory_is_empty() {
        let (_dir, mailbox) = mailbox();
        let id = AgentId::for_issue("GHOST-1");
        assert!(mailbox.peek(&id).unwrap().is_empty());
    }
}
