//! Goals and the plans embedded in them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::NpcId;

/// The synthetic goal type reserved for the always-on `survive` drive. It
/// is never persisted under `(npc_id, goal_type)` as a real goal and is
/// excluded from every goal-listing API.
pub const SURVIVE_GOAL_TYPE: &str = "survive";

pub fn is_survive_goal_type(goal_type: &str) -> bool {
    goal_type.eq_ignore_ascii_case(SURVIVE_GOAL_TYPE)
}

/// Reserved importance values. Lower means higher priority.
pub mod importance {
    pub const COMBAT: i32 = 5;
    pub const URGENT: i32 = 10;
    pub const DEFAULT: i32 = 50;
    pub const BACKGROUND: i32 = 100;
}

/// An ordered list of natural-language steps attached to a goal, tracked by
/// completion indices.
///
/// Invariants (enforced by construction and by the only mutators,
/// [`GoalPlan::complete_current_step`] and [`GoalPlan::skip_step`]):
/// `current_step ∈ [-1, steps.len())`, `completed_steps ⊆ [0, steps.len())`,
/// and `is_complete() ⇔ completed_steps covers [0, steps.len())`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalPlan {
    pub steps: Vec<String>,
    /// -1 means "no plan" or "plan complete".
    pub current_step: i32,
    pub completed_steps: Vec<usize>,
}

impl GoalPlan {
    /// Build a fresh plan from an ordered step list, starting at step 0
    /// (or -1 if there are no steps).
    pub fn from_steps(steps: Vec<String>) -> Self {
        let current_step = if steps.is_empty() { -1 } else { 0 };
        Self {
            steps,
            current_step,
            completed_steps: Vec::new(),
        }
    }

    /// Parse the pipe-separated plan-template grammar used by
    /// `[plan:step1|step2|…]` and default-goal plan templates.
    pub fn from_pipe_separated(spec: &str) -> Self {
        let steps = spec
            .split('|')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self::from_steps(steps)
    }

    pub fn is_complete(&self) -> bool {
        !self.steps.is_empty()
            && (0..self.steps.len()).all(|i| self.completed_steps.contains(&i))
    }

    pub fn current_step_text(&self) -> Option<&str> {
        if self.current_step < 0 {
            return None;
        }
        self.steps.get(self.current_step as usize).map(|s| s.as_str())
    }

    /// `[step:done|complete]`: mark the current step complete, then scan
    /// forward from `current_step + 1` for the next uncompleted index; if
    /// none, scan from 0 up to `current_step`; if still none, set
    /// `current_step = -1` and the plan is complete.
    ///
    /// A missing current step (`current_step == -1` already, or an
    /// already-empty plan) is a no-op — Open Question (ii) in DESIGN.md.
    pub fn complete_current_step(&mut self) {
        if self.current_step < 0 || self.steps.is_empty() {
            return;
        }
        let current = self.current_step as usize;
        if !self.completed_steps.contains(&current) {
            self.completed_steps.push(current);
        }

        let next = ((current + 1)..self.steps.len())
            .find(|i| !self.completed_steps.contains(i))
            .or_else(|| (0..current).find(|i| !self.completed_steps.contains(i)));

        self.current_step = match next {
            Some(i) => i as i32,
            None => -1,
        };
    }

    /// `[step:skip|next]`: advance `current_step` by one without marking
    /// completion, bounded by the step count.
    pub fn skip_step(&mut self) {
        if self.current_step < 0 || self.steps.is_empty() {
            return;
        }
        let next = self.current_step + 1;
        if (next as usize) < self.steps.len() {
            self.current_step = next;
        }
    }

    /// Serialize into the `plan` key of a goal's opaque JSON params,
    /// merging with (and preserving) any sibling keys already present.
    pub fn merge_into_params(&self, mut params: serde_json::Value) -> serde_json::Value {
        if !params.is_object() {
            params = serde_json::json!({});
        }
        params["plan"] = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        params
    }

    /// Inverse of [`GoalPlan::merge_into_params`]: extract the `plan` key,
    /// or an empty plan if absent/unparsable.
    pub fn from_params(params: &serde_json::Value) -> Self {
        params
            .get("plan")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

/// A goal row. At most one active goal per `(npc_id, goal_type)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcGoal {
    pub npc_id: NpcId,
    pub goal_type: String,
    pub target_player: Option<String>,
    pub params: serde_json::Value,
    pub status: String,
    pub importance: i32,
    pub updated_at: DateTime<Utc>,
}

impl NpcGoal {
    pub fn new(npc_id: NpcId, goal_type: impl Into<String>, importance: i32) -> Self {
        Self {
            npc_id,
            goal_type: goal_type.into(),
            target_player: None,
            params: serde_json::json!({}),
            status: "active".to_string(),
            importance,
            updated_at: Utc::now(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_player = Some(normalize_player_name(&target.into()));
        self
    }

    pub fn plan(&self) -> GoalPlan {
        GoalPlan::from_params(&self.params)
    }

    pub fn set_plan(&mut self, plan: &GoalPlan) {
        self.params = plan.merge_into_params(self.params.clone());
    }

    /// Validate the uniqueness/reserved-type invariants the store enforces
    /// before persisting a goal.
    pub fn validated(self) -> Result<Self, DomainError> {
        if self.npc_id.as_str().trim().is_empty() {
            return Err(DomainError::validation("npc_id must not be empty"));
        }
        if is_survive_goal_type(&self.goal_type) {
            return Err(DomainError::invariant(
                "survive is a drive, never a persisted goal",
            ));
        }
        Ok(self)
    }
}

/// Target player names are normalized to lowercase for matching.
pub fn normalize_player_name(name: &str) -> String {
    name.trim().to_lowercase()
}
