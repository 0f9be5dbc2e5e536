//! Per-NPC profile: capability queries collapsed into one struct of
//! optional descriptors, replacing the interface-hierarchy approach
//! (`ILlmNpc`, `IHasDefaultGoal`, `IHasDefaultNeeds`, `IHasKeyLocations`,
//! `IShopkeeper`) the source patterns use (§9 design notes). "Does this
//! NPC provide X?" becomes `profile.default_goal.is_some()` rather than a
//! downcast or a trait-object query.

use std::collections::HashMap;

use loreweave_domain::{goal::importance, GoalPlan, NpcCapabilities, NpcId};

/// Declares the goal an NPC should have whenever none of that type
/// exists — bootstrapped on first load and re-created after any
/// clear/completion removes it (§4.G).
#[derive(Debug, Clone)]
pub struct DefaultGoalTemplate {
    pub goal_type: String,
    pub target: Option<String>,
    /// Pipe-separated plan template, parsed with [`GoalPlan::from_pipe_separated`].
    pub plan_template: Option<String>,
    pub importance: i32,
}

impl DefaultGoalTemplate {
    pub fn new(goal_type: impl Into<String>) -> Self {
        Self {
            goal_type: goal_type.into(),
            target: None,
            plan_template: None,
            importance: importance::DEFAULT,
        }
    }

    pub fn with_plan(mut self, plan_template: impl Into<String>) -> Self {
        self.plan_template = Some(plan_template.into());
        self
    }

    pub fn plan(&self) -> GoalPlan {
        match &self.plan_template {
            Some(template) => GoalPlan::from_pipe_separated(template),
            None => GoalPlan::default(),
        }
    }
}

/// How a need synthesizes a goal when an NPC has no active goal (§4.G
/// need-to-goal derivation).
#[derive(Debug, Clone)]
pub struct NeedGoalMapping {
    /// The goal type to synthesize. `None` ⇒ by convention, reuse the
    /// need's own type as the goal type.
    pub goal_type: Option<String>,
    pub plan_template: Option<String>,
}

/// A stationary trader's wares, consulted by the `give`/trade command
/// paths. Kept intentionally thin — inventory/pricing bookkeeping is an
/// external collaborator's concern (§1 Non-goals); this only records
/// that the NPC *is* a shopkeeper for prompt/context purposes.
#[derive(Debug, Clone, Default)]
pub struct ShopProfile {
    pub sells_item_ids: Vec<String>,
}

/// Optional descriptors an NPC may or may not provide, queried by the
/// context builder and goal/plan manager instead of walking an
/// inheritance chain.
#[derive(Debug, Clone)]
pub struct NpcProfile {
    pub npc_id: NpcId,
    pub capabilities: NpcCapabilities,
    pub default_goal: Option<DefaultGoalTemplate>,
    pub need_goal_map: HashMap<String, NeedGoalMapping>,
    /// Named locations this NPC knows about, e.g. "home" -> room id —
    /// consulted by pathing-adjacent evaluators and prompt framing.
    pub key_locations: HashMap<String, String>,
    pub shop: Option<ShopProfile>,
}

impl NpcProfile {
    pub fn new(npc_id: NpcId, capabilities: NpcCapabilities) -> Self {
        Self {
            npc_id,
            capabilities,
            default_goal: None,
            need_goal_map: HashMap::new(),
            key_locations: HashMap::new(),
            shop: None,
        }
    }

    pub fn with_default_goal(mut self, template: DefaultGoalTemplate) -> Self {
        self.default_goal = Some(template);
        self
    }

    pub fn is_shopkeeper(&self) -> bool {
        self.shop.is_some()
    }
}
