//! Goal/plan manager (§4.G): upsert/clear/done markup semantics,
//! default-goal bootstrap, and need-to-goal derivation, built only
//! against the goal/need store ports so it has no opinion on SQLite vs.
//! any other backing store.
//!
//! Grounded on the teacher's `infrastructure/persistence/goal_store.rs`
//! keying convention (`(npc_id, goal_type)` upsert-by-primary-key) plus
//! `application/npc_profile.rs`'s `DefaultGoalTemplate`/`NeedGoalMapping`
//! descriptors, which this service is the sole consumer of.

use std::sync::Arc;

use loreweave_domain::{
    goal::{importance, is_survive_goal_type},
    GoalPlan, NpcGoal, NpcId, NpcNeed,
};
use loreweave_shared::{GoalDirective, PlanDirective, StepAction, StepDirective};

use crate::application::npc_profile::NpcProfile;
use crate::infrastructure::persistence::{NpcGoalStorePort, NpcNeedStorePort};

pub struct GoalPlanManager {
    goals: Arc<dyn NpcGoalStorePort>,
    needs: Arc<dyn NpcNeedStorePort>,
}

impl GoalPlanManager {
    pub fn new(goals: Arc<dyn NpcGoalStorePort>, needs: Arc<dyn NpcNeedStorePort>) -> Self {
        Self { goals, needs }
    }

    /// On first load of an NPC that declares a default goal, upsert it
    /// only if no goal of that type already exists (§4.G "Default-goal
    /// bootstrap"). Safe to call on every load — it's a no-op once the
    /// goal exists.
    pub async fn bootstrap_default_goal(&self, profile: &NpcProfile) {
        let Some(template) = &profile.default_goal else { return };
        if self.goals.get(&profile.npc_id, &template.goal_type).await.is_some() {
            return;
        }
        self.restore_default_goal(profile).await;
    }

    /// Re-create the default goal from its template, used both by
    /// bootstrap and after any clear/completion that removes the default
    /// type (§4.G).
    async fn restore_default_goal(&self, profile: &NpcProfile) {
        let Some(template) = &profile.default_goal else { return };
        let mut goal = NpcGoal::new(profile.npc_id.clone(), &template.goal_type, template.importance);
        if let Some(target) = &template.target {
            goal = goal.with_target(target.clone());
        }
        goal.set_plan(&template.plan());
        self.goals.upsert(goal).await;
    }

    /// `[goal:<type> [target]]` with `type != survive` upserts an active
    /// goal at Default importance with empty plan params; `survive` is
    /// ignored — it is a drive, not a persisted goal.
    async fn upsert_from_markup(&self, npc_id: &NpcId, goal_type: &str, target: Option<String>) {
        if is_survive_goal_type(goal_type) {
            return;
        }
        let mut goal = NpcGoal::new(npc_id.clone(), goal_type, importance::DEFAULT);
        if let Some(target) = target {
            goal = goal.with_target(target);
        }
        self.goals.upsert(goal).await;
    }

    /// `[goal:clear]` (all, except `survive`, which is never stored
    /// anyway) or `[goal:clear <type>]`; restores the default goal if the
    /// cleared type was it.
    async fn clear(&self, npc_id: &NpcId, goal_type: Option<&str>, profile: &NpcProfile) {
        match goal_type {
            Some(goal_type) => {
                self.goals.clear(npc_id, goal_type).await;
                if profile.default_goal.as_ref().is_some_and(|t| t.goal_type == goal_type) {
                    self.restore_default_goal(profile).await;
                }
            }
            None => {
                self.goals.clear_all(npc_id, true).await;
                self.restore_default_goal(profile).await;
            }
        }
    }

    /// `[goal:done|complete <type>]`: same as a single-type clear (§4.E
    /// groups `done`/`complete`/`none` together; at the goal level these
    /// are clears rather than step completions).
    async fn done(&self, npc_id: &NpcId, goal_type: Option<&str>, profile: &NpcProfile) {
        self.clear(npc_id, goal_type, profile).await;
    }

    /// Apply a parsed `[goal:…]` directive.
    pub async fn apply_goal_directive(&self, npc_id: &NpcId, directive: &GoalDirective, profile: &NpcProfile) {
        match directive {
            GoalDirective::Upsert { goal_type, target } => {
                self.upsert_from_markup(npc_id, goal_type, target.clone()).await;
            }
            GoalDirective::Clear(goal_type) => {
                self.clear(npc_id, goal_type.as_deref(), profile).await;
            }
            GoalDirective::Done(goal_type) => {
                self.done(npc_id, goal_type.as_deref(), profile).await;
            }
        }
    }

    /// The goal a plan/step directive without an explicit type prefix
    /// targets: the top (lowest-importance) active goal (§4.G).
    async fn top_goal(&self, npc_id: &NpcId) -> Option<NpcGoal> {
        self.goals
            .get_all(npc_id)
            .await
            .into_iter()
            .min_by_key(|g| g.importance)
    }

    async fn target_goal(&self, npc_id: &NpcId, goal_type: Option<&str>) -> Option<NpcGoal> {
        match goal_type {
            Some(goal_type) => self.goals.get(npc_id, goal_type).await,
            None => self.top_goal(npc_id).await,
        }
    }

    /// Apply a parsed `[plan:…]` directive: replace the targeted goal's
    /// plan wholesale.
    pub async fn apply_plan_directive(&self, npc_id: &NpcId, directive: &PlanDirective) {
        let Some(goal) = self.target_goal(npc_id, directive.goal_type.as_deref()).await else {
            return;
        };
        let plan = GoalPlan::from_steps(directive.steps.clone());
        let params = plan.merge_into_params(goal.params.clone());
        self.goals.update_params(&goal.npc_id, &goal.goal_type, params).await;
    }

    /// Apply a parsed `[step:…]` directive, advancing or completing the
    /// current step of the targeted goal's plan. A plan that completes as
    /// a result clears the owning goal and restores the default goal if
    /// applicable (§4.G).
    pub async fn apply_step_directive(
        &self,
        npc_id: &NpcId,
        directive: &StepDirective,
        profile: &NpcProfile,
    ) {
        let Some(goal) = self.target_goal(npc_id, directive.goal_type.as_deref()).await else {
            return;
        };
        let mut plan = goal.plan();
        match directive.action {
            StepAction::Done => plan.complete_current_step(),
            StepAction::Skip => plan.skip_step(),
        }

        if plan.is_complete() {
            self.clear(&goal.npc_id, Some(&goal.goal_type), profile).await;
            return;
        }

        let params = plan.merge_into_params(goal.params.clone());
        self.goals.update_params(&goal.npc_id, &goal.goal_type, params).await;
    }

    /// When an NPC has no active goal, consult its need→goal mapping and
    /// synthesize a goal from the top (lowest-level) need (§4.G
    /// "Need-to-goal derivation"). Returns the synthesized goal type, if
    /// any, for tracing/debugging.
    pub async fn derive_goal_from_needs(&self, profile: &NpcProfile) -> Option<String> {
        if !self.goals.get_all(&profile.npc_id).await.is_empty() {
            return None;
        }

        let mut needs: Vec<NpcNeed> = self.needs.get_all(&profile.npc_id).await;
        needs.sort_by_key(|n| n.level);
        let top_need = needs.first()?;

        let mapping = profile.need_goal_map.get(&top_need.need_type)?;
        let goal_type = mapping.goal_type.clone().unwrap_or_else(|| top_need.need_type.clone());

        let mut goal = NpcGoal::new(profile.npc_id.clone(), goal_type.clone(), importance::BACKGROUND);
        if let Some(template) = &mapping.plan_template {
            goal.set_plan(&GoalPlan::from_pipe_separated(template));
        }
        self.goals.upsert(goal).await;
        Some(goal_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::npc_profile::{DefaultGoalTemplate, NeedGoalMapping};
    use crate::infrastructure::persistence::{SqliteNpcGoalStore, SqliteNpcNeedStore};
    use loreweave_domain::NpcCapabilities;
    use sqlx::SqlitePool;

    async fn manager() -> (GoalPlanManager, Arc<SqliteNpcGoalStore>, Arc<SqliteNpcNeedStore>) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::infrastructure::persistence::bootstrap_schema(&pool).await.unwrap();
        let goals = Arc::new(SqliteNpcGoalStore::new(pool.clone()));
        let needs = Arc::new(SqliteNpcNeedStore::new(pool));
        (GoalPlanManager::new(goals.clone(), needs.clone()), goals, needs)
    }

    fn profile(npc: &str) -> NpcProfile {
        NpcProfile::new(NpcId::new(npc), NpcCapabilities::HUMANOID)
    }

    #[tokio::test]
    async fn goal_markup_upserts_goal_at_default_importance() {
        let (mgr, goals, _needs) = manager().await;
        let npc = NpcId::new("barnaby");
        mgr.apply_goal_directive(
            &npc,
            &GoalDirective::Upsert { goal_type: "deliver".into(), target: Some("alice".into()) },
            &profile("barnaby"),
        )
        .await;

        let stored = goals.get(&npc, "deliver").await.unwrap();
        assert_eq!(stored.importance, importance::DEFAULT);
        assert_eq!(stored.target_player.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn goal_markup_ignores_survive_type() {
        let (mgr, goals, _needs) = manager().await;
        let npc = NpcId::new("barnaby");
        mgr.apply_goal_directive(
            &npc,
            &GoalDirective::Upsert { goal_type: "survive".into(), target: None },
            &profile("barnaby"),
        )
        .await;
        assert!(goals.get_all(&npc).await.is_empty());
    }

    #[tokio::test]
    async fn plan_progression_scenario_advances_current_step() {
        let (mgr, goals, _needs) = manager().await;
        let npc = NpcId::new("barnaby");
        let mut goal = NpcGoal::new(npc.clone(), "deliver", importance::DEFAULT);
        goal.set_plan(&GoalPlan::from_steps(vec!["find alice".into(), "give package".into()]));
        goals.upsert(goal).await;

        mgr.apply_step_directive(
            &npc,
            &StepDirective { goal_type: None, action: StepAction::Done },
            &profile("barnaby"),
        )
        .await;

        let updated = goals.get(&npc, "deliver").await.unwrap();
        let plan = updated.plan();
        assert_eq!(plan.completed_steps, vec![0]);
        assert_eq!(plan.current_step, 1);
    }

    #[tokio::test]
    async fn completing_last_step_clears_the_goal() {
        let (mgr, goals, _needs) = manager().await;
        let npc = NpcId::new("barnaby");
        let mut goal = NpcGoal::new(npc.clone(), "deliver", importance::DEFAULT);
        goal.set_plan(&GoalPlan::from_steps(vec!["find alice".into()]));
        goals.upsert(goal).await;

        mgr.apply_step_directive(
            &npc,
            &StepDirective { goal_type: None, action: StepAction::Done },
            &profile("barnaby"),
        )
        .await;

        assert!(goals.get(&npc, "deliver").await.is_none());
    }

    #[tokio::test]
    async fn clearing_the_default_goal_restores_it_from_template() {
        let (mgr, goals, _needs) = manager().await;
        let npc = NpcId::new("guard");
        let mut profile = profile("guard");
        profile.default_goal =
            Some(DefaultGoalTemplate::new("patrol").with_plan("go to gate|go to market"));
        mgr.bootstrap_default_goal(&profile).await;
        assert!(goals.get(&npc, "patrol").await.is_some());

        mgr.apply_goal_directive(&npc, &GoalDirective::Clear(Some("patrol".into())), &profile).await;

        let restored = goals.get(&npc, "patrol").await.unwrap();
        assert_eq!(restored.plan().steps.len(), 2);
    }

    #[tokio::test]
    async fn bootstrap_is_a_no_op_once_the_goal_exists() {
        let (mgr, goals, _needs) = manager().await;
        let mut profile = profile("guard");
        profile.default_goal = Some(DefaultGoalTemplate::new("patrol"));
        mgr.bootstrap_default_goal(&profile).await;

        goals.update_params(&NpcId::new("guard"), "patrol", serde_json::json!({"note": "custom"})).await;
        mgr.bootstrap_default_goal(&profile).await;

        let stored = goals.get(&NpcId::new("guard"), "patrol").await.unwrap();
        assert_eq!(stored.params["note"], "custom");
    }

    #[tokio::test]
    async fn need_derivation_synthesizes_a_goal_when_none_active() {
        let (mgr, goals, needs) = manager().await;
        let npc = NpcId::new("wolf");
        needs.upsert(NpcNeed::new(npc.clone(), "hunger", 5)).await;

        let mut profile = profile("wolf");
        profile
            .need_goal_map
            .insert("hunger".into(), NeedGoalMapping { goal_type: Some("hunt".into()), plan_template: None });

        let derived = mgr.derive_goal_from_needs(&profile).await;
        assert_eq!(derived.as_deref(), Some("hunt"));
        assert!(goals.get(&npc, "hunt").await.is_some());
    }

    #[tokio::test]
    async fn need_derivation_skips_when_a_goal_is_already_active() {
        let (mgr, goals, needs) = manager().await;
        let npc = NpcId::new("wolf");
        goals.upsert(NpcGoal::new(npc.clone(), "wander", importance::BACKGROUND)).await;
        needs.upsert(NpcNeed::new(npc.clone(), "hunger", 5)).await;

        let mut profile = profile("wolf");
        profile
            .need_goal_map
            .insert("hunger".into(), NeedGoalMapping { goal_type: Some("hunt".into()), plan_template: None });

        assert!(mgr.derive_goal_from_needs(&profile).await.is_none());
    }
}
