//! Markup vocabulary shared between the response parser (§4.E, which
//! produces these) and the command executor / goal-plan manager (§4.F,
//! §4.G, which consume them).

use serde::{Deserialize, Serialize};

/// `[cmd:<name> <args>]` or `{cmd:…}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub name: String,
    pub args: String,
}

/// `[goal:…]` directive variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalDirective {
    /// `[goal:<type> [target]]`, `type != survive`.
    Upsert {
        goal_type: String,
        target: Option<String>,
    },
    /// `[goal:clear]` (all) or `[goal:clear <type>]`.
    Clear(Option<String>),
    /// `[goal:done|complete <type>]`.
    Done(Option<String>),
}

/// `[plan:[<goalType>:]step1|step2|…]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDirective {
    /// `None` ⇒ targets the top (lowest-importance) active goal.
    pub goal_type: Option<String>,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepAction {
    /// `done` | `complete`.
    Done,
    /// `skip` | `next`.
    Skip,
}

/// `[step:[<goalType>:]done|complete|skip|next]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDirective {
    pub goal_type: Option<String>,
    pub action: StepAction,
}

/// A single parsed markup, tagged by family, with the byte offsets it
/// occupied in the raw response — used by the response parser to sort,
/// de-overlap, and interleave markups with speech runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMarkup {
    pub start: usize,
    pub end: usize,
    pub kind: MarkupKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkupKind {
    Command(ParsedCommand),
    Goal(GoalDirective),
    Plan(PlanDirective),
    Step(StepDirective),
}

/// Case-insensitive forbidden-command set (§4.E): markup may never invoke
/// these, and speech/emote must come from natural prose rather than
/// `[cmd:say …]` / `[cmd:emote …]`.
pub const FORBIDDEN_COMMANDS: &[&str] = &[
    "quit", "logout", "exit", "password", "save", "delete", "suicide", "patch", "stat",
    "destruct", "reset", "goto", "pwd", "ls", "cd", "cat", "more", "edit", "ledit", "perf", "say",
    "emote", "me", "'",
];

pub fn is_forbidden_command(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    FORBIDDEN_COMMANDS.iter().any(|forbidden| *forbidden == lowered)
}
