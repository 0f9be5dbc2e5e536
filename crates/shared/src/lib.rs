//! Vocabulary shared by more than one engine component, or that crosses a
//! port boundary to an external observer (trace fabric subscribers).
//! Mirrors the teacher's split of a thin "shared wire vocabulary" crate
//! away from `domain`, scaled to this core's much smaller cross-boundary
//! surface (no player-facing wire protocol here — see Non-goals).

pub mod markup;
pub mod trace;
pub mod verbs;

pub use markup::{
    is_forbidden_command, GoalDirective, MarkupKind, ParsedCommand, ParsedMarkup, PlanDirective,
    StepAction, StepDirective, FORBIDDEN_COMMANDS,
};
pub use trace::{TraceCategory, TraceEvent};
pub use verbs::CommandVerb;
