//! Per-NPC feedback log: the last few outcomes of executed commands, fed
//! back into the next prompt so an NPC can react to its own failures.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// The feedback log keeps at most this many entries; older ones are
/// dropped as new ones arrive.
pub const MAX_FEEDBACK_ENTRIES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    Ok,
    Failed,
}

/// One executed-command outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub outcome: CommandOutcome,
    pub command: String,
    pub detail: String,
}

impl CommandResult {
    pub fn ok(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            outcome: CommandOutcome::Ok,
            command: command.into(),
            detail: detail.into(),
        }
    }

    pub fn failed(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            outcome: CommandOutcome::Failed,
            command: command.into(),
            detail: detail.into(),
        }
    }

    /// Render as the `OK: ...` / `FAILED: ...` line shown to the NPC.
    pub fn render(&self) -> String {
        match self.outcome {
            CommandOutcome::Ok => format!("OK: {} — {}", self.command, self.detail),
            CommandOutcome::Failed => format!("FAILED: {} — {}", self.command, self.detail),
        }
    }
}

/// A bounded, FIFO feedback log holding the most recent
/// [`MAX_FEEDBACK_ENTRIES`] [`CommandResult`]s for one NPC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResultLog {
    entries: VecDeque<CommandResult>,
}

impl CommandResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: CommandResult) {
        if self.entries.len() == MAX_FEEDBACK_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(result);
    }

    /// View entries oldest-first without consuming them.
    pub fn peek(&self) -> impl Iterator<Item = &CommandResult> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
