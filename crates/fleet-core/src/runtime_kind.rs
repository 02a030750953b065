// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assistant runtime variants, per spec §9: duck-typed runtime adapters
//! collapse to a small set of variants with a common capability record.
//! The core never reflects on fields; it only reads `command_template`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    Claude,
    Codex,
    Cursor,
    Gemini,
}

/// Capability record for one runtime variant (spec §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeCapabilities {
    pub skills: bool,
    pub commands: bool,
    pub multi_model: bool,
    pub background_agents: bool,
    pub plan_mode: bool,
}

impl RuntimeKind {
    pub fn binary_name(&self) -> &'static str {
        match self {
            RuntimeKind::Claude => "claude",
            RuntimeKind::Codex => "codex",
            RuntimeKind::Cursor => "cursor-agent",
            RuntimeKind::Gemini => "gemini",
        }
    }

    pub fn capabilities(&self) -> RuntimeCapabilities {
        match self {
            RuntimeKind::Claude => RuntimeCapabilities {
                skills: true,
                commands: true,
                multi_model: true,
                background_agents: true,
                plan_mode: true,
            },
            RuntimeKind::Codex => RuntimeCapabilities {
                skills: false,
                commands: true,
                multi_model: false,
                background_agents: false,
                plan_mode: false,
            },
            RuntimeKind::Cursor => RuntimeCapabilities {
                skills: false,
                commands: true,
                multi_model: true,
                background_agents: true,
                plan_mode: false,
            },
            RuntimeKind::Gemini => RuntimeCapabilities {
                skills: false,
                commands: false,
                multi_model: true,
                background_agents: false,
                plan_mode: false,
            },
        }
    }

    /// Builds the shell command issued to spawn this assistant, per spec §6:
    /// `<assistant> --model <m> "<p with \" and newlines escaped>"`.
    pub fn command(&self, model: &str, prompt: &str) -> String {
        format!(
            "{} --model {} \"{}\"",
            self.binary_name(),
            model,
            escape_prompt(prompt)
        )
    }

    /// Resume variant of the command, per spec §6: "the command includes
    /// `--resume <session-id>`".
    pub fn resume_command(&self, model: &str, session_id: &str, prompt: &str) -> String {
        format!(
            "{} --model {} --resume {} \"{}\"",
            self.binary_name(),
            model,
            session_id,
            escape_prompt(prompt)
        )
    }
}

/// Escapes `"` and newlines for embedding the prompt in a double-quoted
/// shell argument, per spec §6.
fn escape_prompt(prompt: &str) -> String {
    prompt.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_escapes_quotes_and_newlines() {
        let cmd = RuntimeKind::Claude.command("opus", "say \"hi\"\nnow");
        assert_eq!(
            cmd,
            r#"claude --model opus "say \"hi\"\nnow""#
        );
    }

    #[test]
    fn resume_command_includes_session_id() {
        let cmd = RuntimeKind::Codex.resume_command("gpt", "sess-123", "continue");
        assert_eq!(cmd, r#"codex --model gpt --resume sess-123 "continue""#);
    }

    #[test]
    fn each_variant_has_a_distinct_binary_name() {
        let names: Vec<_> = [
            RuntimeKind::Claude,
            RuntimeKind::Codex,
            RuntimeKind::Cursor,
            RuntimeKind::Gemini,
        ]
        .iter()
        .map(|k| k.binary_name())
        .collect();
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}
