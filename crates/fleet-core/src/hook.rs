// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook (fixed-point queue) item shape, per spec §3 `Hook`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::cmp::Ordering;

/// Priority band. Sort order is `Urgent < High < Normal < Low`
/// (spec §3: "urgent < high < normal < low").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Urgent => write!(f, "urgent"),
            Priority::High => write!(f, "high"),
            Priority::Normal => write!(f, "normal"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Kind of hook item, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookItemType {
    Task,
    Message,
    Notification,
}

/// One entry in `agents/<id>/hook.json`, per spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: HookItemType,
    pub priority: Priority,
    pub source: String,
    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl HookItem {
    /// An item with `expires_at` in the past is invisible to all readers
    /// (spec §3 invariant).
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_ms)
    }

    /// Ordering used by `check`: (priority, arrival) ascending, per spec §3.
    pub fn ordering_key(&self) -> (Priority, i64) {
        (self.priority, self.created_at)
    }
}
