//! Shared semantic world-knowledge-base entries.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::NpcId;

/// Who may see a `WorldKbEntry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KbVisibility {
    /// Visible to every NPC.
    Public,
    /// Visible only to system-level callers (never returned from
    /// NPC-scoped `search`).
    System,
    /// Visible only to the NPCs named in `npc_ids`.
    Npc,
}

/// A single key/value row in the world knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldKbEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub tags: HashSet<String>,
    pub visibility: KbVisibility,
    /// `None` ⇒ common knowledge (not visibility-restricted by NPC).
    pub npc_ids: Option<HashSet<NpcId>>,
    pub summary: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub updated_at: DateTime<Utc>,
}

impl WorldKbEntry {
    /// `visibility` is derived entirely from whether `npc_ids` is
    /// non-empty, per the KB seed-file grammar (§6): `--npcs` present ⇒
    /// `npc`, else `public`.
    pub fn visibility_for(npc_ids: &Option<HashSet<NpcId>>) -> KbVisibility {
        match npc_ids {
            Some(ids) if !ids.is_empty() => KbVisibility::Npc,
            _ => KbVisibility::Public,
        }
    }

    /// Whether `caller` (or no caller at all) may see this entry under the
    /// NPC-scoped visibility rule used by `WorldKnowledgeBase::search`:
    /// include entries where `npc_ids` is `None` (common) or contains the
    /// caller; when no caller is given, only common entries are returned.
    pub fn visible_to(&self, caller: Option<&NpcId>) -> bool {
        if self.visibility == KbVisibility::System {
            return false;
        }
        match (&self.npc_ids, caller) {
            (None, _) => true,
            (Some(ids), Some(npc)) => ids.contains(npc),
            (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(npc_ids: Option<HashSet<NpcId>>) -> WorldKbEntry {
        WorldKbEntry {
            key: "tavern_rumor".to_string(),
            value: serde_json::json!({"text": "the mine collapsed"}),
            tags: HashSet::new(),
            visibility: WorldKbEntry::visibility_for(&npc_ids),
            npc_ids,
            summary: None,
            embedding: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn common_entry_visible_without_caller() {
        let e = entry(None);
        assert!(e.visible_to(None));
        assert!(e.visible_to(Some(&NpcId::new("anyone"))));
    }

    #[test]
    fn restricted_entry_requires_matching_caller() {
        let mut ids = HashSet::new();
        ids.insert(NpcId::new("barnaby"));
        let e = entry(Some(ids));
        assert_eq!(e.visibility, KbVisibility::Npc);
        assert!(e.visible_to(Some(&NpcId::new("barnaby"))));
        assert!(!e.visible_to(Some(&NpcId::new("someone-else"))));
        assert!(!e.visible_to(None));
    }
}
