//! Per-NPC in-memory runtime state: the command feedback log and the
//! remembered interactor id for the NPC's current response (§3
//! "Ownership" — "an NPC exclusively owns its in-memory state and
//! feedback log").
//!
//! Grounded on the teacher's `ConnectionManager`
//! (`crates/engine/src/api/connections.rs`): a `DashMap`-keyed registry
//! guarding small per-entity state, rather than one global lock.

use std::sync::Arc;

use dashmap::DashMap;

use loreweave_domain::{CommandResult, CommandResultLog, NpcId};

#[derive(Debug, Default)]
struct NpcRuntimeState {
    feedback: CommandResultLog,
    /// The entity this NPC is currently responding to, remembered for
    /// the duration of one response (§4.F "Interactor resolution").
    current_interactor: Option<String>,
}

/// Registry of per-NPC runtime state, shared across the cognition
/// pipeline. One instance per running engine.
#[derive(Clone, Default)]
pub struct NpcRuntimeRegistry {
    states: Arc<DashMap<NpcId, NpcRuntimeState>>,
}

impl NpcRuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_feedback(&self, npc_id: &NpcId, result: CommandResult) {
        self.states.entry(npc_id.clone()).or_default().feedback.push(result);
    }

    /// Drains the feedback log: the context builder reads it once per
    /// prompt and the log is then cleared (§3 CommandResult: "peek-able
    /// by the context builder, cleared on read").
    pub fn drain_feedback(&self, npc_id: &NpcId) -> Vec<CommandResult> {
        let Some(mut entry) = self.states.get_mut(npc_id) else {
            return Vec::new();
        };
        let drained: Vec<CommandResult> = entry.feedback.peek().cloned().collect();
        entry.feedback.clear();
        drained
    }

    /// Set the entity this NPC is currently reacting to — e.g. the
    /// speaker of the room event that triggered this turn. Overwritten
    /// on every new turn; never explicitly cleared.
    pub fn set_interactor(&self, npc_id: &NpcId, interactor_id: Option<String>) {
        self.states.entry(npc_id.clone()).or_default().current_interactor = interactor_id;
    }

    pub fn interactor(&self, npc_id: &NpcId) -> Option<String> {
        self.states.get(npc_id).and_then(|s| s.current_interactor.clone())
    }
}
