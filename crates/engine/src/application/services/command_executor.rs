//! Command executor (§4.F): validates, dispatches, and records the
//! success/failure of one parsed NPC action.
//!
//! State machine per action: parse → capability gate → target
//! resolution → side-effect → event emit → feedback record → trace.
//! Grounded on the teacher's command-dispatch loop in
//! `application/services` (verb lookup table + early capability/target
//! failure returns before any world mutation) generalized from its fixed
//! player-verb set to this spec's full §4.F table, and on
//! `NpcRuntimeRegistry`/`TraceFabric` for the feedback/trace tail of the
//! pipeline.

use std::sync::Arc;

use loreweave_domain::{CommandResult, NpcCapabilities, NpcId, RoomEvent, RoomId};
use loreweave_shared::{CommandVerb, ParsedCommand, TraceCategory};

use crate::application::npc_profile::NpcProfile;
use crate::application::npc_runtime::NpcRuntimeRegistry;
use crate::application::ports::world_ports::{
    CombatPort, ItemPort, LocalCommandPort, NpcMovementPort, PlayerDirectoryPort, RoomDirectoryPort,
    SessionMessengerPort,
};
use crate::application::services::response_parser::NpcAction;
use crate::infrastructure::trace::TraceFabric;

/// A room event tagged with the room it happened in — movement emits a
/// departure in the origin room and an arrival in the destination, so a
/// single untagged event isn't enough.
#[derive(Debug, Clone)]
pub struct RoomEventAt {
    pub room_id: RoomId,
    pub event: RoomEvent,
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub result: CommandResult,
    pub events: Vec<RoomEventAt>,
}

impl ExecutionOutcome {
    fn ok(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { result: CommandResult::ok(command, detail), events: Vec::new() }
    }

    fn failed(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { result: CommandResult::failed(command, detail), events: Vec::new() }
    }

    fn with_event(mut self, room_id: RoomId, event: RoomEvent) -> Self {
        self.events.push(RoomEventAt { room_id, event });
        self
    }
}

fn pick_exit(exits: &[String]) -> Option<String> {
    use rand::seq::SliceRandom;
    exits.choose(&mut rand::thread_rng()).cloned()
}

fn flee_succeeds() -> bool {
    rand::random::<f32>() < 0.5
}

/// `give item to target` / `give target item`, and the literal `player`
/// keyword standing in for the current interactor (§4.F).
fn parse_give(args: &str) -> Option<(String, String)> {
    let lower = args.to_lowercase();
    if let Some(idx) = lower.find(" to ") {
        let item = args[..idx].trim();
        let target = args[idx + 4..].trim();
        if item.is_empty() || target.is_empty() {
            return None;
        }
        return Some((item.to_string(), target.to_string()));
    }
    let mut words = args.split_whitespace();
    let first = words.next()?;
    let rest: String = words.collect::<Vec<_>>().join(" ");
    if rest.is_empty() {
        return None;
    }
    Some((rest, first.to_string()))
}

pub struct CommandExecutor {
    rooms: Arc<dyn RoomDirectoryPort>,
    players: Arc<dyn PlayerDirectoryPort>,
    items: Arc<dyn ItemPort>,
    combat: Arc<dyn CombatPort>,
    messenger: Arc<dyn SessionMessengerPort>,
    movement: Arc<dyn NpcMovementPort>,
    local: Arc<dyn LocalCommandPort>,
    runtime: NpcRuntimeRegistry,
    trace: Arc<TraceFabric>,
}

impl CommandExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rooms: Arc<dyn RoomDirectoryPort>,
        players: Arc<dyn PlayerDirectoryPort>,
        items: Arc<dyn ItemPort>,
        combat: Arc<dyn CombatPort>,
        messenger: Arc<dyn SessionMessengerPort>,
        movement: Arc<dyn NpcMovementPort>,
        local: Arc<dyn LocalCommandPort>,
        runtime: NpcRuntimeRegistry,
        trace: Arc<TraceFabric>,
    ) -> Self {
        Self { rooms, players, items, combat, messenger, movement, local, runtime, trace }
    }

    async fn resolve_target(&self, room_id: &RoomId, fragment: &str, interactor: Option<&str>) -> Option<String> {
        if fragment.eq_ignore_ascii_case("player") {
            let candidate = interactor?;
            return self.players.resolve_in_room(room_id, candidate).await;
        }
        self.players.resolve_in_room(room_id, fragment).await
    }

    async fn execute_say(&self, npc_id: &NpcId, npc_name: &str, room_id: &RoomId, message: &str) -> ExecutionOutcome {
        self.messenger.say_to_room(room_id, npc_id.as_str(), &format!("{npc_name} says, \"{message}\"")).await;
        let event = RoomEvent::Speech {
            actor_id: npc_id.as_str().to_string(),
            actor_name: npc_name.to_string(),
            message: message.to_string(),
        };
        ExecutionOutcome::ok("say", message).with_event(room_id.clone(), event)
    }

    async fn execute_emote(&self, npc_id: &NpcId, npc_name: &str, room_id: &RoomId, message: &str) -> ExecutionOutcome {
        self.messenger.say_to_room(room_id, npc_id.as_str(), &format!("{npc_name} {message}")).await;
        let event = RoomEvent::Emote {
            actor_id: npc_id.as_str().to_string(),
            actor_name: npc_name.to_string(),
            message: message.to_string(),
        };
        ExecutionOutcome::ok("emote", message).with_event(room_id.clone(), event)
    }

    async fn execute_go(&self, npc_id: &NpcId, npc_name: &str, room_id: &RoomId, command: &ParsedCommand) -> ExecutionOutcome {
        let direction = CommandVerb::direction_for_alias(&command.name.to_lowercase())
            .map(str::to_string)
            .unwrap_or_else(|| command.args.trim().to_lowercase());
        if direction.is_empty() {
            return ExecutionOutcome::failed("go", "no direction given");
        }

        let Some(room) = self.rooms.snapshot(room_id).await else {
            return ExecutionOutcome::failed("go", "current room is unknown");
        };
        if !room.exits.iter().any(|e| e.eq_ignore_ascii_case(&direction)) {
            return ExecutionOutcome::failed("go", format!("no exit {direction}"));
        }

        let Some(destination) = self.rooms.load_destination(room_id, &direction).await else {
            return ExecutionOutcome::failed("go", "destination blocked");
        };

        self.movement.move_npc(npc_id, room_id, &destination).await;

        let departure = RoomEvent::Departure {
            actor_id: npc_id.as_str().to_string(),
            actor_name: npc_name.to_string(),
            direction: Some(direction.clone()),
        };
        let arrival = RoomEvent::Arrival {
            actor_id: npc_id.as_str().to_string(),
            actor_name: npc_name.to_string(),
            direction: Some(direction.clone()),
        };

        ExecutionOutcome::ok("go", format!("moved {direction}"))
            .with_event(room_id.clone(), departure)
            .with_event(destination, arrival)
    }

    async fn execute_item_move(
        &self,
        npc_id: &NpcId,
        npc_name: &str,
        room_id: &RoomId,
        verb: &str,
        target_fragment: &str,
        to_room: bool,
    ) -> ExecutionOutcome {
        let Some(item_id) = self.items.resolve_item(npc_id, target_fragment).await else {
            return ExecutionOutcome::failed(verb, format!("no such item: {target_fragment}"));
        };
        let (from, to) = if to_room {
            (npc_id.as_str().to_string(), room_id.as_str().to_string())
        } else {
            (room_id.as_str().to_string(), npc_id.as_str().to_string())
        };
        if let Err(reason) = self.items.move_item(&item_id, &from, &to).await {
            return ExecutionOutcome::failed(verb, reason);
        }
        let event = if to_room {
            RoomEvent::ItemDropped {
                actor_id: npc_id.as_str().to_string(),
                actor_name: npc_name.to_string(),
                target: target_fragment.to_string(),
            }
        } else {
            RoomEvent::ItemTaken {
                actor_id: npc_id.as_str().to_string(),
                actor_name: npc_name.to_string(),
                target: target_fragment.to_string(),
            }
        };
        ExecutionOutcome::ok(verb, target_fragment).with_event(room_id.clone(), event)
    }

    async fn execute_give(
        &self,
        npc_id: &NpcId,
        room_id: &RoomId,
        args: &str,
        interactor: Option<&str>,
    ) -> ExecutionOutcome {
        let Some((item_fragment, target_fragment)) = parse_give(args) else {
            return ExecutionOutcome::failed("give", "could not parse item and target");
        };
        let Some(target_id) = self.resolve_target(room_id, &target_fragment, interactor).await else {
            return ExecutionOutcome::failed("give", format!("no such target: {target_fragment}"));
        };
        let Some(item_id) = self.items.resolve_item(npc_id, &item_fragment).await else {
            return ExecutionOutcome::failed("give", format!("no such item: {item_fragment}"));
        };
        if let Err(reason) = self.items.move_item(&item_id, npc_id.as_str(), &target_id).await {
            return ExecutionOutcome::failed("give", reason);
        }
        ExecutionOutcome::ok("give", format!("gave {item_fragment} to {target_fragment}"))
    }

    async fn execute_equip(&self, npc_id: &NpcId, verb: &str, target_fragment: &str, equip: bool) -> ExecutionOutcome {
        let Some(item_id) = self.items.resolve_item(npc_id, target_fragment).await else {
            return ExecutionOutcome::failed(verb, format!("no such item: {target_fragment}"));
        };
        let (from, to) = if equip {
            (npc_id.as_str().to_string(), format!("{}:equipped", npc_id.as_str()))
        } else {
            (format!("{}:equipped", npc_id.as_str()), npc_id.as_str().to_string())
        };
        if let Err(reason) = self.items.move_item(&item_id, &from, &to).await {
            return ExecutionOutcome::failed(verb, reason);
        }
        ExecutionOutcome::ok(verb, target_fragment)
    }

    async fn execute_attack(&self, npc_id: &NpcId, room_id: &RoomId, target_fragment: &str) -> ExecutionOutcome {
        let Some(target_id) = self.resolve_target(room_id, target_fragment, None).await else {
            return ExecutionOutcome::failed("attack", format!("no such target: {target_fragment}"));
        };
        if let Err(reason) = self.combat.start_combat(npc_id, &target_id).await {
            return ExecutionOutcome::failed("attack", reason);
        }
        ExecutionOutcome::ok("attack", format!("attacks {target_fragment}"))
    }

    async fn execute_flee(&self, npc_id: &NpcId, npc_name: &str, room_id: &RoomId) -> ExecutionOutcome {
        if !self.combat.is_in_combat(npc_id).await {
            return ExecutionOutcome::failed("flee", "not in combat");
        }

        if !flee_succeeds() {
            let event = RoomEvent::Combat {
                actor_id: npc_id.as_str().to_string(),
                actor_name: npc_name.to_string(),
                target: None,
                message: "tries to flee but fails".to_string(),
            };
            return ExecutionOutcome::ok("flee", "tries to flee but fails").with_event(room_id.clone(), event);
        }

        self.combat.end_combat(npc_id).await;
        let room = self.rooms.snapshot(room_id).await;
        let exits = room.map(|r| r.exits).unwrap_or_default();
        let Some(direction) = pick_exit(&exits) else {
            return ExecutionOutcome::ok("flee", "escapes the fight");
        };
        if let Some(destination) = self.rooms.load_destination(room_id, &direction).await {
            self.movement.move_npc(npc_id, room_id, &destination).await;
        }
        ExecutionOutcome::ok("flee", format!("flees {direction}"))
    }

    async fn execute_use(&self, npc_id: &NpcId, target_fragment: &str) -> ExecutionOutcome {
        if self.items.resolve_item(npc_id, target_fragment).await.is_none() {
            return ExecutionOutcome::failed("use", format!("no such item: {target_fragment}"));
        }
        ExecutionOutcome::ok("use", format!("uses {target_fragment}"))
    }

    async fn execute_local(&self, room_id: &RoomId, name: &str, args: &str) -> ExecutionOutcome {
        match self.local.try_invoke(room_id, name, args).await {
            Some(Ok(detail)) => ExecutionOutcome::ok(name, detail),
            Some(Err(reason)) => ExecutionOutcome::failed(name, reason),
            None => ExecutionOutcome::failed(name, "unknown command"),
        }
    }

    async fn dispatch_command(
        &self,
        npc_id: &NpcId,
        npc_name: &str,
        room_id: &RoomId,
        command: &ParsedCommand,
        interactor: Option<&str>,
    ) -> (CommandVerb, ExecutionOutcome) {
        let alias = command.name.to_lowercase();
        let verb = CommandVerb::from_alias(&alias).unwrap_or(CommandVerb::Local);

        let outcome = match verb {
            CommandVerb::Say => self.execute_say(npc_id, npc_name, room_id, command.args.trim()).await,
            CommandVerb::Emote => self.execute_emote(npc_id, npc_name, room_id, command.args.trim()).await,
            CommandVerb::Go => self.execute_go(npc_id, npc_name, room_id, command).await,
            CommandVerb::Get => {
                self.execute_item_move(npc_id, npc_name, room_id, "get", command.args.trim(), false).await
            }
            CommandVerb::Drop => {
                self.execute_item_move(npc_id, npc_name, room_id, "drop", command.args.trim(), true).await
            }
            CommandVerb::Give => self.execute_give(npc_id, room_id, command.args.trim(), interactor).await,
            CommandVerb::Equip => self.execute_equip(npc_id, "equip", command.args.trim(), true).await,
            CommandVerb::Unequip => self.execute_equip(npc_id, "unequip", command.args.trim(), false).await,
            CommandVerb::Attack => self.execute_attack(npc_id, room_id, command.args.trim()).await,
            CommandVerb::Flee => self.execute_flee(npc_id, npc_name, room_id).await,
            CommandVerb::Use => self.execute_use(npc_id, command.args.trim()).await,
            CommandVerb::Local => self.execute_local(room_id, &command.name, command.args.trim()).await,
        };
        (verb, outcome)
    }

    /// Execute one parsed action for `npc_id` located in `room_id`. Goal,
    /// Plan, and Step actions are not this component's concern (the goal
    /// plan manager owns those) — callers route them there instead and
    /// never reach this method for those variants.
    pub async fn execute(
        &self,
        npc_id: &NpcId,
        npc_name: &str,
        profile: &NpcProfile,
        room_id: &RoomId,
        action: &NpcAction,
        interactor: Option<&str>,
    ) -> Option<ExecutionOutcome> {
        let (verb_label, _required, outcome) = match action {
            NpcAction::Speech(message) => {
                if !profile.capabilities.can(NpcCapabilities::CAN_SPEAK) {
                    ("say", NpcCapabilities::CAN_SPEAK, None)
                } else {
                    ("say", NpcCapabilities::CAN_SPEAK, Some(self.execute_say(npc_id, npc_name, room_id, message).await))
                }
            }
            NpcAction::Emote(message) => {
                if !profile.capabilities.can(NpcCapabilities::CAN_EMOTE) {
                    ("emote", NpcCapabilities::CAN_EMOTE, None)
                } else {
                    (
                        "emote",
                        NpcCapabilities::CAN_EMOTE,
                        Some(self.execute_emote(npc_id, npc_name, room_id, message).await),
                    )
                }
            }
            NpcAction::Command(command) => {
                let alias = command.name.to_lowercase();
                let verb = CommandVerb::from_alias(&alias).unwrap_or(CommandVerb::Local);
                let required = verb.required_capability();
                if !profile.capabilities.can(required) {
                    (command.name.as_str(), required, None)
                } else {
                    let (_, outcome) = self.dispatch_command(npc_id, npc_name, room_id, command, interactor).await;
                    (command.name.as_str(), required, Some(outcome))
                }
            }
            NpcAction::Goal(_) | NpcAction::Plan(_) | NpcAction::Step(_) => return None,
        };

        let outcome = match outcome {
            Some(outcome) => outcome,
            None => ExecutionOutcome::failed(verb_label, "missing the capability required for this action"),
        };

        self.runtime.record_feedback(npc_id, outcome.result.clone());
        self.trace.emit(npc_id, TraceCategory::Cmd, outcome.result.render()).await;
        Some(outcome)
    }
}
