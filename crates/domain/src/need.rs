//! Drives that back-fill goals when an NPC has nothing better to do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::NpcId;

/// The one drive every NPC carries implicitly at level 1, never persisted
/// as a row by that fact alone — see [`crate::goal::SURVIVE_GOAL_TYPE`] for
/// the goal-side half of this rule.
pub const SURVIVE_NEED_TYPE: &str = "survive";

/// Lifecycle state of a need row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedStatus {
    Active,
    Satisfied,
    Suppressed,
}

/// A single need row, keyed by `(npc_id, need_type)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcNeed {
    pub npc_id: NpcId,
    pub need_type: String,
    /// Urgency, conventionally `0` (quiescent) to `100` (critical).
    pub level: i32,
    pub params: serde_json::Value,
    pub status: NeedStatus,
    pub updated_at: DateTime<Utc>,
}

impl NpcNeed {
    pub fn new(npc_id: NpcId, need_type: impl Into<String>, level: i32) -> Self {
        Self {
            npc_id,
            need_type: need_type.into(),
            level,
            params: serde_json::json!({}),
            status: NeedStatus::Active,
            updated_at: Utc::now(),
        }
    }

    /// The always-on survival drive, auto-applied to every NPC at level 1
    /// rather than persisted per spec.
    pub fn survive(npc_id: NpcId) -> Self {
        Self::new(npc_id, SURVIVE_NEED_TYPE, 1)
    }

    pub fn is_survive(&self) -> bool {
        is_survive_need_type(&self.need_type)
    }
}

pub fn is_survive_need_type(need_type: &str) -> bool {
    need_type.eq_ignore_ascii_case(SURVIVE_NEED_TYPE)
}
