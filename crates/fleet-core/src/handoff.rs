// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handoff context, per spec §3 `HandoffContext` and §4.7.

use serde::{Deserialize, Serialize};

/// Kill-and-spawn for work agents, specialist-wake for specialists
/// (spec §4.7 auto-detection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandoffMode {
    KillAndSpawn,
    SpecialistWake,
}

/// Captured context for a handoff, persisted as Markdown under
/// `agents/<id>/handoffs/handoff-<ts>.md` and passed as the successor's
/// initial prompt (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffContext {
    pub agent_id: String,
    pub issue_id: String,
    pub target_model: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Last N lines of captured pane output, empty if capture failed
    /// (spec §4.7 failure semantics).
    #[serde(default)]
    pub captured_output: String,
    #[serde(default)]
    pub relevant_files: Vec<String>,
}

impl HandoffContext {
    /// Renders the Markdown handoff prompt used as the successor agent's
    /// initial prompt (spec §4.7 step 2).
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Handoff: {}\n\n", self.agent_id));
        out.push_str(&format!("- Issue: {}\n", self.issue_id));
        out.push_str(&format!("- Target model: {}\n", self.target_model));
        out.push_str(&format!("- Reason: {}\n", self.reason));
        if let Some(branch) = &self.git_branch {
            out.push_str(&format!("- Git branch: {}\n", branch));
        }
        if !self.relevant_files.is_empty() {
            out.push_str("- Relevant files:\n");
            for f in &self.relevant_files {
                out.push_str(&format!("  - {}\n", f));
            }
        }
        if !self.captured_output.is_empty() {
            out.push_str("\n## Last session output\n\n```\n");
            out.push_str(&self.captured_output);
            out.push_str("\n```\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_markdown_includes_core_fields() {
        let ctx = HandoffContext {
            agent_id: "agent-min-42".into(),
            issue_id: "MIN-42".into(),
            target_model: "opus".into(),
            reason: "stuck".into(),
            git_branch: Some("feat/min-42".into()),
            captured_output: "last line".into(),
            relevant_files: vec!["src/lib.rs".into()],
        };
        let md = ctx.render_markdown();
        assert!(md.contains("agent-min-42"));
        assert!(md.contains("opus"));
        assert!(md.contains("feat/min-42"));
        assert!(md.contains("src/lib.rs"));
        assert!(md.contains("last line"));
    }

    #[test]
    fn render_markdown_omits_empty_sections() {
        let ctx = HandoffContext {
            agent_id: "agent-min-1".into(),
            issue_id: "MIN-1".into(),
            target_model: "sonnet".into(),
            reason: "handoff".into(),
            git_branch: None,
            captured_output: String::new(),
            relevant_files: vec![],
        };
        let md = ctx.render_markdown();
        assert!(!md.contains("Relevant files"));
        assert!(!md.contains("Last session output"));
    }
}
