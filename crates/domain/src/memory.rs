//! Episodic per-NPC memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clamp::clamp_importance;
use crate::error::DomainError;
use crate::ids::{AreaId, MemoryId, NpcId, RoomId};

/// A single episodic memory row. Immutable after insert; pruned by expiry,
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcMemory {
    pub id: MemoryId,
    pub npc_id: NpcId,
    pub subject: Option<String>,
    pub room_id: Option<RoomId>,
    pub area_id: Option<AreaId>,
    pub kind: String,
    pub importance: i32,
    pub tags: Vec<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub embedding: Option<Vec<f32>>,
}

/// Maximum length, in characters, of a memory's `content` field.
pub const MAX_MEMORY_CONTENT_CHARS: usize = 512;

/// Request payload for `NpcMemoryStore::add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcMemoryWrite {
    pub id: MemoryId,
    pub npc_id: NpcId,
    pub subject: Option<String>,
    pub room_id: Option<RoomId>,
    pub area_id: Option<AreaId>,
    pub kind: String,
    pub importance: i32,
    pub tags: Vec<String>,
    pub content: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub embedding: Option<Vec<f32>>,
}

impl NpcMemoryWrite {
    /// Validate the write against the store's invariants: non-empty id,
    /// non-empty npc id, importance clamped into range, content bounded.
    ///
    /// # Errors
    /// Returns `DomainError::Validation` if `npc_id` is empty — the one
    /// invariant violation the store is documented to raise (§4.A).
    pub fn validated(mut self) -> Result<Self, DomainError> {
        if self.npc_id.as_str().trim().is_empty() {
            return Err(DomainError::validation("npc_id must not be empty"));
        }
        self.importance = clamp_importance(self.importance);
        if self.content.chars().count() > MAX_MEMORY_CONTENT_CHARS {
            self.content = self
                .content
                .chars()
                .take(MAX_MEMORY_CONTENT_CHARS)
                .collect();
        }
        Ok(self)
    }
}

/// Query parameters for `NpcMemoryStore::recall`.
#[derive(Debug, Clone)]
pub struct MemoryRecallQuery {
    pub npc_id: NpcId,
    pub subject: Option<String>,
    pub tags: Vec<String>,
    pub candidate_limit: usize,
    pub top_k: usize,
    pub query_embedding: Option<Vec<f32>>,
    pub as_of: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(npc: &str, importance: i32, content: &str) -> NpcMemoryWrite {
        NpcMemoryWrite {
            id: MemoryId::new(),
            npc_id: NpcId::new(npc),
            subject: None,
            room_id: None,
            area_id: None,
            kind: "conversation".to_string(),
            importance,
            tags: vec![],
            content: content.to_string(),
            expires_at: None,
            embedding: None,
        }
    }

    #[test]
    fn rejects_empty_npc_id() {
        let w = write("", 30, "hello");
        assert!(w.validated().is_err());
    }

    #[test]
    fn clamps_importance_into_range() {
        let w = write("barnaby", 500, "hello").validated().unwrap();
        assert_eq!(w.importance, 100);
    }

    #[test]
    fn truncates_content_to_bound() {
        let long = "x".repeat(1000);
        let w = write("barnaby", 30, &long).validated().unwrap();
        assert_eq!(w.content.chars().count(), MAX_MEMORY_CONTENT_CHARS);
    }
}
