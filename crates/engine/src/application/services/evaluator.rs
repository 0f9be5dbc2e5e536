//! Evaluator registry (§4.H): pluggable, deterministic step-completion
//! checks. Evaluators never mutate state — each is a pure function of a
//! world snapshot and a goal, consulting read-only collaborator ports
//! (pathing, inventory) only to decide, never to act.
//!
//! Grounded on the teacher's strategy-registry pattern (ordered `Vec<Box<dyn
//! Trait>>`, first non-trivial result wins) used for its own evaluation
//! chains, generalized from a single concrete check to this spec's
//! insertion-order registry.

use std::sync::Arc;

use async_trait::async_trait;

use loreweave_domain::{NpcGoal, NpcId};

use crate::application::ports::world_ports::RoomSnapshot;
use crate::application::ports::{ItemPort, PathingPort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalStatus {
    InProgress,
    Complete,
    Blocked,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalResult {
    pub status: EvalStatus,
    pub reason: Option<String>,
    /// A markup the scheduler may feed back as the NPC's next action,
    /// e.g. `[cmd:go north]` toward a reach-room target.
    pub suggested_action: Option<String>,
}

impl EvalResult {
    pub fn not_applicable() -> Self {
        Self { status: EvalStatus::NotApplicable, reason: None, suggested_action: None }
    }

    pub fn complete(reason: impl Into<String>) -> Self {
        Self { status: EvalStatus::Complete, reason: Some(reason.into()), suggested_action: None }
    }

    pub fn in_progress(suggested_action: Option<String>) -> Self {
        Self { status: EvalStatus::InProgress, reason: None, suggested_action }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self { status: EvalStatus::Blocked, reason: Some(reason.into()), suggested_action: None }
    }
}

/// Case-insensitive substring match; an empty filter list means "any".
fn matches_filter(filters: &[&str], haystack: &str) -> bool {
    if filters.is_empty() {
        return true;
    }
    let haystack = haystack.to_lowercase();
    filters.iter().any(|f| haystack.contains(&f.to_lowercase()))
}

fn fuzzy_contains(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let needle = needle.trim().to_lowercase();
    !needle.is_empty() && (haystack.contains(&needle) || needle.contains(&haystack))
}

/// Extract the text following the first matching keyword, e.g. `"go to
/// tavern"` + keyword `"go to"` → `"tavern"`.
fn parse_target_after_keyword(step_text: &str, keywords: &[&str]) -> Option<String> {
    let lower = step_text.to_lowercase();
    for kw in keywords {
        if let Some(idx) = lower.find(kw) {
            let rest = &step_text[idx + kw.len()..];
            let target = rest.trim();
            if !target.is_empty() {
                return Some(target.to_string());
            }
        }
    }
    None
}

#[async_trait]
pub trait StepEvaluator: Send + Sync {
    /// Goal types this evaluator applies to (substring, case-insensitive);
    /// empty ⇒ any goal type.
    fn applicable_goal_types(&self) -> &[&str];

    /// Step-text keywords this evaluator applies to (substring,
    /// case-insensitive); empty ⇒ any step text.
    fn applicable_step_keywords(&self) -> &[&str];

    async fn evaluate(
        &self,
        npc_id: &NpcId,
        goal: &NpcGoal,
        step_text: &str,
        room: &RoomSnapshot,
    ) -> EvalResult;
}

/// Tries registered evaluators in insertion order; the first result that
/// isn't [`EvalStatus::NotApplicable`] wins.
pub struct EvaluatorRegistry {
    evaluators: Vec<Box<dyn StepEvaluator>>,
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self { evaluators: Vec::new() }
    }

    pub fn register(&mut self, evaluator: Box<dyn StepEvaluator>) {
        self.evaluators.push(evaluator);
    }

    pub async fn evaluate(
        &self,
        npc_id: &NpcId,
        goal: &NpcGoal,
        step_text: &str,
        room: &RoomSnapshot,
    ) -> EvalResult {
        for evaluator in &self.evaluators {
            if !matches_filter(evaluator.applicable_goal_types(), &goal.goal_type) {
                continue;
            }
            if !matches_filter(evaluator.applicable_step_keywords(), step_text) {
                continue;
            }
            let result = evaluator.evaluate(npc_id, goal, step_text, room).await;
            if result.status != EvalStatus::NotApplicable {
                return result;
            }
        }
        EvalResult::not_applicable()
    }
}

/// Complete when the NPC's current room fuzzy-matches the step's target;
/// otherwise asks the pathing collaborator for the next direction and
/// suggests `[cmd:go <dir>]`.
pub struct ReachRoomEvaluator {
    pathing: Arc<dyn PathingPort>,
}

impl ReachRoomEvaluator {
    const KEYWORDS: [&'static str; 3] = ["go to", "visit", "travel to"];

    pub fn new(pathing: Arc<dyn PathingPort>) -> Self {
        Self { pathing }
    }
}

#[async_trait]
impl StepEvaluator for ReachRoomEvaluator {
    fn applicable_goal_types(&self) -> &[&str] {
        &[]
    }

    fn applicable_step_keywords(&self) -> &[&str] {
        &Self::KEYWORDS
    }

    async fn evaluate(
        &self,
        _npc_id: &NpcId,
        _goal: &NpcGoal,
        step_text: &str,
        room: &RoomSnapshot,
    ) -> EvalResult {
        let Some(target) = parse_target_after_keyword(step_text, &Self::KEYWORDS) else {
            return EvalResult::not_applicable();
        };

        if fuzzy_contains(&room.name, &target) || fuzzy_contains(room.id.as_str(), &target) {
            return EvalResult::complete(format!("arrived at {}", room.name));
        }

        match self.pathing.next_direction_toward(&room.id, &target).await {
            Some(direction) => EvalResult::in_progress(Some(format!("[cmd:go {direction}]"))),
            None => EvalResult::blocked(format!("no path known toward {target}")),
        }
    }
}

/// Complete when the target item fuzzy-matches anything already in the
/// NPC's inventory.
pub struct AcquireItemEvaluator {
    items: Arc<dyn ItemPort>,
}

impl AcquireItemEvaluator {
    const KEYWORDS: [&'static str; 3] = ["get ", "take ", "acquire "];

    pub fn new(items: Arc<dyn ItemPort>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl StepEvaluator for AcquireItemEvaluator {
    fn applicable_goal_types(&self) -> &[&str] {
        &[]
    }

    fn applicable_step_keywords(&self) -> &[&str] {
        &Self::KEYWORDS
    }

    async fn evaluate(
        &self,
        npc_id: &NpcId,
        _goal: &NpcGoal,
        step_text: &str,
        _room: &RoomSnapshot,
    ) -> EvalResult {
        let Some(target) = parse_target_after_keyword(step_text, &Self::KEYWORDS) else {
            return EvalResult::not_applicable();
        };

        if self.items.inventory_contains(npc_id, &target).await {
            EvalResult::complete(format!("now carrying {target}"))
        } else {
            EvalResult::in_progress(Some(format!("[cmd:get {target}]")))
        }
    }
}
