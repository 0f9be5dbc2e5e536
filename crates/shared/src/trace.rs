//! Wire shape for the trace/debug fabric's emissions (component K).
//!
//! Distinct from `tracing`'s structured logs: these are domain-level
//! narration events, fanned out to whichever observer sessions subscribed
//! to the emitting NPC, not to a log sink.

use serde::{Deserialize, Serialize};

use loreweave_domain::NpcId;

/// Category tag attached to every trace emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TraceCategory {
    Goal,
    Plan,
    Step,
    Path,
    Cmd,
    Llm,
    Mem,
    Event,
}

/// One fire-and-forget emission delivered to every subscriber currently
/// attached to `npc_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub npc_id: NpcId,
    pub category: TraceCategory,
    pub message: String,
}

impl TraceEvent {
    pub fn new(npc_id: NpcId, category: TraceCategory, message: impl Into<String>) -> Self {
        Self {
            npc_id,
            category,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_uppercase() {
        let json = serde_json::to_value(TraceCategory::Goal).unwrap();
        assert_eq!(json, "GOAL");
    }

    #[test]
    fn event_carries_its_npc_and_message() {
        let e = TraceEvent::new(NpcId::new("barnaby"), TraceCategory::Cmd, "tried to flee");
        assert_eq!(e.npc_id.as_str(), "barnaby");
        assert_eq!(e.message, "tried to flee");
    }
}
