//! Cognition pipeline (§2 "Data flow per NPC turn"): the orchestrator that
//! strings every other §4 component into one NPC decision turn. Nothing
//! here is novel logic — it is purely sequencing calls into
//! `ContextBuilder`, `LlmPort`, `parse_npc_response`, `CommandExecutor`,
//! `GoalPlanManager`, `EvaluatorRegistry`, `TraceFabric`, and the write
//! queue in the order §2 lays out.
//!
//! Grounded on the teacher's `player_action_queue_service.rs`: a thin
//! service struct holding `Arc`s to every collaborator it sequences,
//! exposing one `async fn` entry point per unit of work, with no
//! branching logic of its own beyond routing.

use std::sync::Arc;

use loreweave_domain::{NpcGoal, NpcId, RoomEvent, RoomId};
use loreweave_shared::TraceCategory;

use crate::application::npc_profile::NpcProfile;
use crate::application::npc_runtime::NpcRuntimeRegistry;
use crate::application::ports::world_ports::RoomDirectoryPort;
use crate::application::ports::{LlmPort, LlmProfile};
use crate::application::services::command_executor::RoomEventAt;
use crate::application::services::{
    parse_npc_response, CommandExecutor, ContextBuilder, EvaluatorRegistry, GoalPlanManager, NpcAction,
};
use crate::infrastructure::persistence::NpcGoalStorePort;
use crate::infrastructure::queue::WriteQueueHandle;
use crate::infrastructure::trace::TraceFabric;

/// What one decision turn produced, for the scheduler to fold back into
/// the world (room events to fan out to observers) and for logging.
#[derive(Debug, Default)]
pub struct TurnOutcome {
    pub raw_response: Option<String>,
    pub actions_executed: usize,
    pub events: Vec<RoomEventAt>,
}

pub struct CognitionPipeline {
    context: Arc<ContextBuilder>,
    llm: Option<Arc<dyn LlmPort>>,
    executor: Arc<CommandExecutor>,
    goals: Arc<GoalPlanManager>,
    goal_store: Arc<dyn NpcGoalStorePort>,
    evaluators: Arc<EvaluatorRegistry>,
    rooms: Arc<dyn RoomDirectoryPort>,
    runtime: NpcRuntimeRegistry,
    trace: Arc<TraceFabric>,
    write_queue: WriteQueueHandle,
}

impl CognitionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: Arc<ContextBuilder>,
        llm: Option<Arc<dyn LlmPort>>,
        executor: Arc<CommandExecutor>,
        goals: Arc<GoalPlanManager>,
        goal_store: Arc<dyn NpcGoalStorePort>,
        evaluators: Arc<EvaluatorRegistry>,
        rooms: Arc<dyn RoomDirectoryPort>,
        runtime: NpcRuntimeRegistry,
        trace: Arc<TraceFabric>,
        write_queue: WriteQueueHandle,
    ) -> Self {
        Self { context, llm, executor, goals, goal_store, evaluators, rooms, runtime, trace, write_queue }
    }

    /// The top (lowest-importance) active goal, matching the targeting
    /// rule the goal/plan manager and context builder both apply (§4.G).
    async fn top_goal(&self, npc_id: &NpcId) -> Option<NpcGoal> {
        self.goal_store.get_all(npc_id).await.into_iter().min_by_key(|g| g.importance)
    }

    /// Deterministic step auto-advance (§4.H, §8 scenario 4): before
    /// spending an LLM call, ask the evaluator registry whether the
    /// current plan step is already resolved by world state. A `Complete`
    /// result closes the step directly; an `InProgress` result's
    /// suggested markup is returned so the caller can execute it without
    /// ever reaching the LLM this turn.
    async fn try_auto_advance(&self, npc_id: &NpcId, profile: &NpcProfile, room_id: &RoomId) -> Option<NpcAction> {
        let goal = self.top_goal(npc_id).await?;
        let plan = goal.plan();
        let step_text = plan.current_step_text()?.to_string();
        let room = self.rooms.snapshot(room_id).await?;

        let result = self.evaluators.evaluate(npc_id, &goal, &step_text, &room).await;
        match result.status {
            crate::application::services::EvalStatus::Complete => {
                self.trace
                    .emit(npc_id, TraceCategory::Step, result.reason.unwrap_or_else(|| "step complete".to_string()))
                    .await;
                self.goals
                    .apply_step_directive(
                        npc_id,
                        &loreweave_shared::StepDirective {
                            goal_type: Some(goal.goal_type.clone()),
                            action: loreweave_shared::StepAction::Done,
                        },
                        profile,
                    )
                    .await;
                None
            }
            crate::application::services::EvalStatus::Blocked => {
                self.trace
                    .emit(npc_id, TraceCategory::Step, result.reason.unwrap_or_else(|| "step blocked".to_string()))
                    .await;
                None
            }
            crate::application::services::EvalStatus::InProgress => {
                result.suggested_action.map(|markup| parse_npc_response(&markup)).and_then(|mut actions| {
                    if actions.is_empty() {
                        None
                    } else {
                        Some(actions.remove(0))
                    }
                })
            }
            crate::application::services::EvalStatus::NotApplicable => None,
        }
    }

    /// Execute one routed action: world-affecting actions go through the
    /// command executor; Goal/Plan/Step markup is the goal/plan
    /// manager's concern instead (§2, §4.F "not this component's
    /// concern").
    async fn route_action(
        &self,
        npc_id: &NpcId,
        npc_name: &str,
        profile: &NpcProfile,
        room_id: &RoomId,
        action: &NpcAction,
        interactor: Option<&str>,
    ) -> Vec<RoomEventAt> {
        match action {
            NpcAction::Goal(directive) => {
                self.goals.apply_goal_directive(npc_id, directive, profile).await;
                self.trace.emit(npc_id, TraceCategory::Goal, format!("{directive:?}")).await;
                Vec::new()
            }
            NpcAction::Plan(directive) => {
                self.goals.apply_plan_directive(npc_id, directive).await;
                self.trace.emit(npc_id, TraceCategory::Plan, format!("{directive:?}")).await;
                Vec::new()
            }
            NpcAction::Step(directive) => {
                self.goals.apply_step_directive(npc_id, directive, profile).await;
                self.trace.emit(npc_id, TraceCategory::Step, format!("{directive:?}")).await;
                Vec::new()
            }
            // Speech/Emote/Command go through the executor, which already
            // records feedback and emits its own trace (§4.F).
            _ => self
                .executor
                .execute(npc_id, npc_name, profile, room_id, action, interactor)
                .await
                .map(|outcome| outcome.events)
                .unwrap_or_default(),
        }
    }

    /// Run one full decision turn for `npc_id`: assemble the prompt,
    /// consult the LLM (unless a deterministic evaluator already resolved
    /// the active step), parse the response, execute each action up to
    /// the §4.E cap, and trace every step along the way.
    #[allow(clippy::too_many_arguments)]
    pub async fn run_turn(
        &self,
        npc_id: &NpcId,
        npc_name: &str,
        profile: &NpcProfile,
        room_id: &RoomId,
        system_prompt: &str,
        health_fraction: f32,
        recent_events: &[RoomEvent],
        interactor: Option<String>,
    ) -> TurnOutcome {
        self.runtime.set_interactor(npc_id, interactor.clone());
        self.goals.bootstrap_default_goal(profile).await;
        self.goals.derive_goal_from_needs(profile).await;

        if let Some(action) = self.try_auto_advance(npc_id, profile, room_id).await {
            let events =
                self.route_action(npc_id, npc_name, profile, room_id, &action, interactor.as_deref()).await;
            return TurnOutcome { raw_response: None, actions_executed: 1, events };
        }

        let Some(llm) = &self.llm else {
            return TurnOutcome::default();
        };

        let prompt_ctx = self.context.build(npc_id, profile, room_id, health_fraction, recent_events).await;
        self.trace.emit(npc_id, TraceCategory::Llm, "requesting decision").await;

        let Some(raw) = llm.complete(system_prompt, &prompt_ctx.render(), LlmProfile::Npc).await else {
            self.trace.emit(npc_id, TraceCategory::Llm, "no response").await;
            return TurnOutcome::default();
        };

        let actions = parse_npc_response(&raw);
        let mut events = Vec::new();
        let mut executed = 0;
        for action in &actions {
            events.extend(
                self.route_action(npc_id, npc_name, profile, room_id, action, interactor.as_deref()).await,
            );
            executed += 1;
        }

        TurnOutcome { raw_response: Some(raw), actions_executed: executed, events }
    }

    /// Promote a candidate memory for one observer witnessing `event`,
    /// enqueuing it through the bounded writer without waiting on
    /// persistence (§2 step "promote observers' memories", §4.A/§4.I).
    pub async fn promote_and_enqueue(
        &self,
        event: &RoomEvent,
        ctx: &crate::application::services::promotion::PromotionContext<'_>,
    ) {
        if let Some(write) = crate::application::services::promote(event, ctx) {
            self.write_queue.enqueue(write).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use loreweave_domain::{DomainError, MemoryRecallQuery, NpcCapabilities, NpcMemory, NpcMemoryWrite, NpcNeed, WorldKbEntry};

    use crate::application::ports::world_ports::{
        CombatPort, ItemPort, LocalCommandPort, NpcMovementPort, PlayerDirectoryPort, PresentActor, SessionMessengerPort,
    };
    use crate::application::ports::LlmPort;
    use crate::application::services::evaluator::{EvalResult, StepEvaluator};
    use crate::application::services::{ContextBuilder, EvaluatorRegistry, GoalPlanManager};
    use crate::infrastructure::persistence::{NpcGoalStorePort, NpcMemoryStorePort, NpcNeedStorePort, WorldKnowledgeBasePort};
    use crate::infrastructure::queue::{BoundedDropOldestQueue, MIN_QUEUE_CAPACITY};
    use crate::infrastructure::trace::TraceFabric;
    use crate::application::ports::trace_port::TraceSinkPort;

    use super::*;

    struct FakeRooms {
        snapshot: Option<RoomSnapshot>,
    }
    #[async_trait]
    impl RoomDirectoryPort for FakeRooms {
        async fn snapshot(&self, _room_id: &RoomId) -> Option<RoomSnapshot> {
            self.snapshot.clone()
        }
        async fn load_destination(&self, _room_id: &RoomId, _exit_direction: &str) -> Option<RoomId> {
            None
        }
    }

    fn fake_room(room_id: &str) -> RoomSnapshot {
        RoomSnapshot {
            id: RoomId::new(room_id),
            name: "Market Square".to_string(),
            description: "a dusty square".to_string(),
            exits: vec!["north".to_string()],
            players_present: vec![PresentActor { id: "alice".to_string(), name: "Alice".to_string(), in_combat: false }],
            npcs_present: Vec::new(),
            items_present: Vec::new(),
        }
    }

    struct NoopPlayers;
    #[async_trait]
    impl PlayerDirectoryPort for NoopPlayers {
        async fn resolve_in_room(&self, _room_id: &RoomId, _name_fragment: &str) -> Option<String> {
            None
        }
    }

    struct NoopItems;
    #[async_trait]
    impl ItemPort for NoopItems {
        async fn resolve_item(&self, _npc_id: &NpcId, _name_fragment: &str) -> Option<String> {
            None
        }
        async fn move_item(&self, _item_id: &str, _from_holder: &str, _to_holder: &str) -> Result<(), String> {
            Ok(())
        }
        async fn inventory_contains(&self, _npc_id: &NpcId, _name_fragment: &str) -> bool {
            false
        }
    }

    struct NoopCombat;
    #[async_trait]
    impl CombatPort for NoopCombat {
        async fn start_combat(&self, _attacker: &NpcId, _defender: &str) -> Result<(), String> {
            Ok(())
        }
        async fn is_in_combat(&self, _npc_id: &NpcId) -> bool {
            false
        }
        async fn end_combat(&self, _npc_id: &NpcId) {}
        async fn run_round(&self) -> Vec<String> {
            Vec::new()
        }
    }

    struct RecordingMessenger {
        said: StdMutex<Vec<String>>,
    }
    #[async_trait]
    impl SessionMessengerPort for RecordingMessenger {
        async fn tell(&self, _target_player_id: &str, _message: &str) {}
        async fn say_to_room(&self, _room_id: &RoomId, _exclude_actor_id: &str, message: &str) {
            self.said.lock().unwrap().push(message.to_string());
        }
    }

    struct NoopMovement;
    #[async_trait]
    impl NpcMovementPort for NoopMovement {
        async fn move_npc(&self, _npc_id: &NpcId, _from_room: &RoomId, _to_room: &RoomId) {}
    }

    struct NoopLocal;
    #[async_trait]
    impl LocalCommandPort for NoopLocal {
        async fn try_invoke(&self, _room_id: &RoomId, _command: &str, _args: &str) -> Option<Result<String, String>> {
            None
        }
    }

    struct NoopMemoryStore;
    #[async_trait]
    impl NpcMemoryStorePort for NoopMemoryStore {
        async fn add(&self, _write: NpcMemoryWrite) -> Result<(), DomainError> {
            Ok(())
        }
        async fn recall(&self, _query: MemoryRecallQuery) -> Vec<NpcMemory> {
            Vec::new()
        }
    }

    struct NoopKb;
    #[async_trait]
    impl WorldKnowledgeBasePort for NoopKb {
        async fn upsert(&self, _entry: WorldKbEntry) {}
        async fn get(&self, _key: &str) -> Option<WorldKbEntry> {
            None
        }
        async fn search_by_tags(&self, _tags: &[String], _caller: Option<&NpcId>) -> Vec<WorldKbEntry> {
            Vec::new()
        }
        async fn search(&self, _text: &str, _caller: Option<&NpcId>) -> Vec<WorldKbEntry> {
            Vec::new()
        }
        async fn delete(&self, _key: &str) {}
    }

    struct NoopNeedStore;
    #[async_trait]
    impl NpcNeedStorePort for NoopNeedStore {
        async fn upsert(&self, _need: NpcNeed) {}
        async fn get_all(&self, _npc_id: &NpcId) -> Vec<NpcNeed> {
            Vec::new()
        }
        async fn clear(&self, _npc_id: &NpcId, _need_type: &str) {}
    }

    #[derive(Default)]
    struct InMemoryGoalStore {
        rows: StdMutex<HashMap<(String, String), NpcGoal>>,
    }
    #[async_trait]
    impl NpcGoalStorePort for InMemoryGoalStore {
        async fn upsert(&self, goal: NpcGoal) {
            self.rows.lock().unwrap().insert((goal.npc_id.as_str().to_string(), goal.goal_type.clone()), goal);
        }
        async fn get(&self, npc_id: &NpcId, goal_type: &str) -> Option<NpcGoal> {
            self.rows.lock().unwrap().get(&(npc_id.as_str().to_string(), goal_type.to_string())).cloned()
        }
        async fn get_all(&self, npc_id: &NpcId) -> Vec<NpcGoal> {
            self.rows.lock().unwrap().values().filter(|g| g.npc_id.as_str() == npc_id.as_str()).cloned().collect()
        }
        async fn update_params(&self, npc_id: &NpcId, goal_type: &str, params: serde_json::Value) {
            if let Some(goal) = self.rows.lock().unwrap().get_mut(&(npc_id.as_str().to_string(), goal_type.to_string())) {
                goal.params = params;
            }
        }
        async fn clear(&self, npc_id: &NpcId, goal_type: &str) {
            self.rows.lock().unwrap().remove(&(npc_id.as_str().to_string(), goal_type.to_string()));
        }
        async fn clear_all(&self, npc_id: &NpcId, _preserve_survival: bool) {
            self.rows.lock().unwrap().retain(|(id, _), _| id != npc_id.as_str());
        }
    }

    struct NoopTraceSink;
    #[async_trait]
    impl TraceSinkPort for NoopTraceSink {
        async fn deliver(&self, _subscriber: loreweave_domain::SubscriberId, _event: &loreweave_shared::TraceEvent) {}
    }

    struct FixedEvaluator {
        result: EvalResult,
    }
    #[async_trait]
    impl StepEvaluator for FixedEvaluator {
        fn applicable_goal_types(&self) -> &[&str] {
            &[]
        }
        fn applicable_step_keywords(&self) -> &[&str] {
            &[]
        }
        async fn evaluate(&self, _npc_id: &NpcId, _goal: &NpcGoal, _step_text: &str, _room: &RoomSnapshot) -> EvalResult {
            self.result.clone()
        }
    }

    struct PanicIfCalledLlm;
    #[async_trait]
    impl LlmPort for PanicIfCalledLlm {
        async fn complete(&self, _system_prompt: &str, _user_message: &str, _profile: LlmProfile) -> Option<String> {
            panic!("llm must not be called when an evaluator already resolved the step");
        }
        async fn complete_with_history(&self, _system_prompt: &str, _history: &[crate::application::ports::ChatTurn], _profile: LlmProfile) -> Option<String> {
            panic!("llm must not be called");
        }
        async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
            None
        }
    }

    struct FixedLlm {
        response: String,
        calls: AtomicUsize,
    }
    #[async_trait]
    impl LlmPort for FixedLlm {
        async fn complete(&self, _system_prompt: &str, _user_message: &str, _profile: LlmProfile) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(self.response.clone())
        }
        async fn complete_with_history(&self, _system_prompt: &str, _history: &[crate::application::ports::ChatTurn], _profile: LlmProfile) -> Option<String> {
            Some(self.response.clone())
        }
        async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
            None
        }
    }

    fn command_executor(messenger: Arc<RecordingMessenger>, trace: Arc<TraceFabric>, room: Option<RoomSnapshot>) -> Arc<CommandExecutor> {
        Arc::new(CommandExecutor::new(
            Arc::new(FakeRooms { snapshot: room }),
            Arc::new(NoopPlayers),
            Arc::new(NoopItems),
            Arc::new(NoopCombat),
            messenger,
            Arc::new(NoopMovement),
            Arc::new(NoopLocal),
            NpcRuntimeRegistry::new(),
            trace,
        ))
    }

    fn context_builder(goal_store: Arc<dyn NpcGoalStorePort>, trace: Arc<TraceFabric>) -> Arc<ContextBuilder> {
        let _ = &trace;
        Arc::new(ContextBuilder::new(
            Arc::new(FakeRooms { snapshot: Some(fake_room("square")) }),
            Arc::new(NoopCombat),
            Arc::new(NoopMemoryStore),
            Arc::new(NoopKb),
            goal_store,
            NpcRuntimeRegistry::new(),
            None,
            5,
            5,
            200,
            false,
        ))
    }

    fn write_queue() -> WriteQueueHandle {
        WriteQueueHandle::new(BoundedDropOldestQueue::new(MIN_QUEUE_CAPACITY))
    }

    fn profile() -> NpcProfile {
        NpcProfile::new(NpcId::new("barnaby"), NpcCapabilities::HUMANOID)
    }

    #[tokio::test]
    async fn promote_and_enqueue_enqueues_a_candidate_write() {
        let trace = Arc::new(TraceFabric::new(Arc::new(NoopTraceSink)));
        let messenger = Arc::new(RecordingMessenger { said: StdMutex::new(Vec::new()) });
        let goal_store: Arc<dyn NpcGoalStorePort> = Arc::new(InMemoryGoalStore::default());
        let queue = write_queue();

        let pipeline = CognitionPipeline::new(
            context_builder(goal_store.clone(), trace.clone()),
            None,
            command_executor(messenger, trace.clone(), None),
            Arc::new(GoalPlanManager::new(goal_store.clone(), Arc::new(NoopNeedStore))),
            goal_store,
            Arc::new(EvaluatorRegistry::new()),
            Arc::new(FakeRooms { snapshot: None }),
            NpcRuntimeRegistry::new(),
            trace,
            queue.clone(),
        );

        let observer = NpcId::new("barnaby");
        let room = RoomId::new("square");
        let ctx = crate::application::services::promotion::PromotionContext {
            observer_id: &observer,
            observer_aliases: &[],
            room_id: &room,
            actor_is_player: true,
            living_entities_in_room: 2,
        };
        let event = RoomEvent::Death { actor_id: "alice".into(), actor_name: "Alice".into() };

        pipeline.promote_and_enqueue(&event, &ctx).await;

        assert_eq!(queue.metrics().enqueued, 1);
    }

    #[tokio::test]
    async fn run_turn_without_llm_or_goal_returns_default_outcome() {
        let trace = Arc::new(TraceFabric::new(Arc::new(NoopTraceSink)));
        let messenger = Arc::new(RecordingMessenger { said: StdMutex::new(Vec::new()) });
        let goal_store: Arc<dyn NpcGoalStorePort> = Arc::new(InMemoryGoalStore::default());

        let pipeline = CognitionPipeline::new(
            context_builder(goal_store.clone(), trace.clone()),
            None,
            command_executor(messenger, trace.clone(), None),
            Arc::new(GoalPlanManager::new(goal_store.clone(), Arc::new(NoopNeedStore))),
            goal_store,
            Arc::new(EvaluatorRegistry::new()),
            Arc::new(FakeRooms { snapshot: None }),
            NpcRuntimeRegistry::new(),
            trace,
            write_queue(),
        );

        let npc = NpcId::new("barnaby");
        let room = RoomId::new("square");
        let outcome = pipeline.run_turn(&npc, "Barnaby", &profile(), &room, "system prompt", 1.0, &[], None).await;

        assert!(outcome.raw_response.is_none());
        assert_eq!(outcome.actions_executed, 0);
        assert!(outcome.events.is_empty());
    }

    #[tokio::test]
    async fn run_turn_auto_advances_and_never_calls_the_llm_when_a_step_is_already_complete() {
        let trace = Arc::new(TraceFabric::new(Arc::new(NoopTraceSink)));
        let messenger = Arc::new(RecordingMessenger { said: StdMutex::new(Vec::new()) });
        let goal_store: Arc<dyn NpcGoalStorePort> = Arc::new(InMemoryGoalStore::default());

        let npc = NpcId::new("barnaby");
        let mut goal = loreweave_domain::NpcGoal::new(npc.clone(), "deliver", loreweave_domain::goal::importance::DEFAULT);
        goal.set_plan(&loreweave_domain::GoalPlan::from_pipe_separated("go to tavern"));
        goal_store.upsert(goal).await;

        let mut evaluators = EvaluatorRegistry::new();
        evaluators.register(Box::new(FixedEvaluator { result: EvalResult::complete("already there") }));

        let pipeline = CognitionPipeline::new(
            context_builder(goal_store.clone(), trace.clone()),
            Some(Arc::new(PanicIfCalledLlm)),
            command_executor(messenger, trace.clone(), Some(fake_room("square"))),
            Arc::new(GoalPlanManager::new(goal_store.clone(), Arc::new(NoopNeedStore))),
            goal_store.clone(),
            Arc::new(evaluators),
            Arc::new(FakeRooms { snapshot: Some(fake_room("square")) }),
            NpcRuntimeRegistry::new(),
            trace,
            write_queue(),
        );

        let room = RoomId::new("square");
        let outcome = pipeline.run_turn(&npc, "Barnaby", &profile(), &room, "system prompt", 1.0, &[], None).await;

        assert_eq!(outcome.actions_executed, 1);
        assert!(outcome.raw_response.is_none());

        let stored = goal_store.get(&npc, "deliver").await.unwrap();
        assert!(stored.plan().is_complete());
    }

    #[tokio::test]
    async fn run_turn_routes_goal_directive_to_goal_manager_without_touching_the_executor() {
        let trace = Arc::new(TraceFabric::new(Arc::new(NoopTraceSink)));
        let messenger = Arc::new(RecordingMessenger { said: StdMutex::new(Vec::new()) });
        let goal_store: Arc<dyn NpcGoalStorePort> = Arc::new(InMemoryGoalStore::default());
        let llm = Arc::new(FixedLlm { response: "[goal:explore]".to_string(), calls: AtomicUsize::new(0) });

        let pipeline = CognitionPipeline::new(
            context_builder(goal_store.clone(), trace.clone()),
            Some(llm.clone()),
            command_executor(messenger.clone(), trace.clone(), Some(fake_room("square"))),
            Arc::new(GoalPlanManager::new(goal_store.clone(), Arc::new(NoopNeedStore))),
            goal_store.clone(),
            Arc::new(EvaluatorRegistry::new()),
            Arc::new(FakeRooms { snapshot: None }),
            NpcRuntimeRegistry::new(),
            trace,
            write_queue(),
        );

        let npc = NpcId::new("barnaby");
        let room = RoomId::new("square");
        let outcome = pipeline.run_turn(&npc, "Barnaby", &profile(), &room, "system prompt", 1.0, &[], None).await;

        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.actions_executed, 1);
        assert!(outcome.events.is_empty());
        assert!(messenger.said.lock().unwrap().is_empty());
        assert!(goal_store.get(&npc, "explore").await.is_some());
    }
}
