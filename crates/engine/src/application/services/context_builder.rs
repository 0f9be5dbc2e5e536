//! Context builder (§4.D): deterministically assembles the user prompt
//! for one NPC decision turn, reading the memory store, knowledge base,
//! goal store, and NPC runtime state but never mutating any of them.
//!
//! Grounded on the teacher's prompt-assembly helpers in
//! `application/services` (fixed section order, plain string
//! concatenation rather than a templating engine) generalized from that
//! file's narrower "describe this room" scope to the full §4.D section
//! list.

use std::sync::Arc;

use loreweave_domain::{
    goal::importance, CommandResult, CommandOutcome, MemoryRecallQuery, NpcGoal, NpcId, RoomEvent,
    RoomId, WorldKbEntry,
};

use crate::application::npc_profile::NpcProfile;
use crate::application::npc_runtime::NpcRuntimeRegistry;
use crate::application::ports::world_ports::{CombatPort, RoomSnapshot};
use crate::application::ports::{LlmPort, LlmProfile, RoomDirectoryPort};
use crate::infrastructure::persistence::{NpcGoalStorePort, NpcMemoryStorePort, WorldKnowledgeBasePort};

const MAX_RECENT_EVENTS: usize = 5;
/// Trailing consecutive `[FAILED]` entries at or above this count attach
/// a re-plan hint (§4.D, §4.F "feedback loop").
const REPLAN_FAILURE_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBucket {
    NearDeath,
    BadlyWounded,
    Wounded,
    SlightlyHurt,
    Healthy,
}

impl HealthBucket {
    /// `fraction` is current/max health in `[0.0, 1.0]`.
    pub fn for_fraction(fraction: f32) -> Self {
        if fraction <= 0.10 {
            HealthBucket::NearDeath
        } else if fraction <= 0.25 {
            HealthBucket::BadlyWounded
        } else if fraction <= 0.50 {
            HealthBucket::Wounded
        } else if fraction <= 0.75 {
            HealthBucket::SlightlyHurt
        } else {
            HealthBucket::Healthy
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            HealthBucket::NearDeath => "near death",
            HealthBucket::BadlyWounded => "badly wounded",
            HealthBucket::Wounded => "wounded",
            HealthBucket::SlightlyHurt => "slightly hurt",
            HealthBucket::Healthy => "healthy",
        }
    }
}

/// The assembled sections for one decision turn, in the fixed §4.D order.
/// Exposed as structured data (rather than only a rendered string) so
/// callers and tests can inspect individual sections.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub health: HealthBucket,
    pub in_combat: bool,
    pub room: Option<RoomSnapshot>,
    pub recent_events: Vec<String>,
    pub goal_summary: Option<String>,
    pub memories: Vec<String>,
    pub kb_hits: Vec<String>,
    pub previous_results: Vec<String>,
    pub forbidden_actions: Vec<&'static str>,
    pub replan_hint: bool,
}

impl PromptContext {
    /// Render the fixed-order prompt body a caller hands the LLM client as
    /// the user message.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        sections.push(format!("You are {}.", self.health.describe()));
        sections.push(if self.in_combat {
            "You are currently in combat.".to_string()
        } else {
            "You are not in combat.".to_string()
        });

        if let Some(room) = &self.room {
            sections.push(format!(
                "Room: {} — {}\nExits: {}",
                room.name,
                room.description,
                if room.exits.is_empty() { "none".to_string() } else { room.exits.join(", ") }
            ));
            let players = room
                .players_present
                .iter()
                .map(|p| if p.in_combat { format!("{} (fighting)", p.name) } else { p.name.clone() })
                .collect::<Vec<_>>()
                .join(", ");
            sections.push(format!("Players present: {}", if players.is_empty() { "none".into() } else { players }));
            let npcs = room.npcs_present.iter().map(|n| n.name.clone()).collect::<Vec<_>>().join(", ");
            sections.push(format!("Other NPCs present: {}", if npcs.is_empty() { "none".into() } else { npcs }));
            let items = room.items_present.join(", ");
            sections.push(format!("Items here: {}", if items.is_empty() { "none".into() } else { items }));
        } else {
            sections.push("Room: unknown".to_string());
        }

        if !self.recent_events.is_empty() {
            sections.push(format!("Recent events:\n{}", self.recent_events.join("\n")));
        }

        if let Some(goal) = &self.goal_summary {
            sections.push(goal.clone());
        }

        if !self.memories.is_empty() {
            sections.push(format!("Relevant memories:\n{}", self.memories.join("\n")));
        }

        if !self.kb_hits.is_empty() {
            sections.push(format!("Relevant knowledge:\n{}", self.kb_hits.join("\n")));
        }

        if !self.previous_results.is_empty() {
            sections.push(format!("Results of your last actions:\n{}", self.previous_results.join("\n")));
        }

        if self.replan_hint {
            sections.push(
                "Your last actions kept failing. Consider abandoning your current plan and trying something different."
                    .to_string(),
            );
        }

        if !self.forbidden_actions.is_empty() {
            sections.push(self.forbidden_actions.join("\n"));
        }

        sections.join("\n\n")
    }
}

fn plan_summary_line(goal: &NpcGoal) -> String {
    let plan = goal.plan();
    match plan.current_step_text() {
        Some(text) => {
            let position = plan.current_step as usize + 1;
            format!(
                "Active goal: {} — step {}/{}: '{}'",
                goal.goal_type,
                position,
                plan.steps.len(),
                text
            )
        }
        None => format!("Active goal: {}", goal.goal_type),
    }
}

fn kb_entry_line(entry: &WorldKbEntry) -> String {
    entry.summary.clone().unwrap_or_else(|| entry.value.to_string())
}

fn failure_summary(results: &[CommandResult]) -> String {
    results
        .iter()
        .filter(|r| r.outcome == CommandOutcome::Failed)
        .map(|r| format!("{} {}", r.command, r.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

fn trailing_consecutive_failures(results: &[CommandResult]) -> usize {
    results.iter().rev().take_while(|r| r.outcome == CommandOutcome::Failed).count()
}

pub struct ContextBuilder {
    rooms: Arc<dyn RoomDirectoryPort>,
    combat: Arc<dyn CombatPort>,
    memories: Arc<dyn NpcMemoryStorePort>,
    kb: Arc<dyn WorldKnowledgeBasePort>,
    goals: Arc<dyn NpcGoalStorePort>,
    runtime: NpcRuntimeRegistry,
    llm: Option<Arc<dyn LlmPort>>,
    memory_top_k: usize,
    kb_top_k: usize,
    candidate_limit: usize,
    use_pgvector: bool,
}

impl ContextBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rooms: Arc<dyn RoomDirectoryPort>,
        combat: Arc<dyn CombatPort>,
        memories: Arc<dyn NpcMemoryStorePort>,
        kb: Arc<dyn WorldKnowledgeBasePort>,
        goals: Arc<dyn NpcGoalStorePort>,
        runtime: NpcRuntimeRegistry,
        llm: Option<Arc<dyn LlmPort>>,
        memory_top_k: usize,
        kb_top_k: usize,
        candidate_limit: usize,
        use_pgvector: bool,
    ) -> Self {
        Self {
            rooms,
            combat,
            memories,
            kb,
            goals,
            runtime,
            llm,
            memory_top_k,
            kb_top_k,
            candidate_limit,
            use_pgvector,
        }
    }

    /// The goal the plan/goal summary section reports: the top
    /// (lowest-importance) active goal, matching the plan manager's own
    /// "no prefix" targeting rule (§4.G).
    async fn top_goal(&self, npc_id: &NpcId) -> Option<NpcGoal> {
        self.goals.get_all(npc_id).await.into_iter().min_by_key(|g| g.importance)
    }

    pub async fn build(
        &self,
        npc_id: &NpcId,
        profile: &NpcProfile,
        room_id: &RoomId,
        health_fraction: f32,
        recent_events: &[RoomEvent],
    ) -> PromptContext {
        let room = self.rooms.snapshot(room_id).await;
        let in_combat = self.combat.is_in_combat(npc_id).await;

        let recent_events: Vec<String> = recent_events
            .iter()
            .rev()
            .take(MAX_RECENT_EVENTS)
            .map(|e| e.narrate())
            .rev()
            .collect();

        let goal = self.top_goal(npc_id).await;
        let goal_summary = goal.as_ref().map(plan_summary_line);

        let previous_results_raw = self.runtime.drain_feedback(npc_id);
        let previous_results: Vec<String> = previous_results_raw.iter().map(|r| r.render()).collect();
        let replan_hint = trailing_consecutive_failures(&previous_results_raw) >= REPLAN_FAILURE_THRESHOLD;

        let query_embedding = if self.use_pgvector {
            match &self.llm {
                Some(llm) => {
                    let mut summary_parts: Vec<String> = recent_events.clone();
                    let failures = failure_summary(&previous_results_raw);
                    if !failures.is_empty() {
                        summary_parts.push(failures);
                    }
                    if summary_parts.is_empty() {
                        None
                    } else {
                        llm.embed(&summary_parts.join(" ")).await
                    }
                }
                None => None,
            }
        } else {
            None
        };

        let memories = self
            .memories
            .recall(MemoryRecallQuery {
                npc_id: npc_id.clone(),
                subject: None,
                tags: vec![],
                candidate_limit: self.candidate_limit,
                top_k: self.memory_top_k,
                query_embedding,
                as_of: chrono::Utc::now(),
            })
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();

        let kb_hits = self
            .kb
            .search_by_tags(&[format!("room:{}", room_id.as_str())], Some(npc_id))
            .await
            .into_iter()
            .take(self.kb_top_k)
            .map(|e| kb_entry_line(&e))
            .collect();

        PromptContext {
            health: HealthBucket::for_fraction(health_fraction),
            in_combat,
            room,
            recent_events,
            goal_summary,
            memories,
            kb_hits,
            previous_results,
            forbidden_actions: profile.capabilities.describe_forbidden(),
            replan_hint,
        }
    }
}
