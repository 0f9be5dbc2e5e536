//! Shared fakes for the end-to-end scenario tests (spec §8). Mirrors the
//! fakes `application::cognition`'s own unit tests use, duplicated here
//! because integration tests compile as separate crates and can't reach
//! into `#[cfg(test)]` modules of the library they're testing.

use std::sync::Mutex as StdMutex;

use async_trait::async_trait;

use loreweave_domain::{NpcId, RoomId};

use loreweave_engine::application::ports::{
    CombatPort, ItemPort, LocalCommandPort, NpcMovementPort, PlayerDirectoryPort, PresentActor, RoomDirectoryPort,
    RoomSnapshot, SessionMessengerPort,
};
use loreweave_engine::application::ports::trace_port::TraceSinkPort;

pub struct FakeRooms {
    pub snapshot: Option<RoomSnapshot>,
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

pub fn room(room_id: &str, room_name: &str) -> RoomSnapshot {
    RoomSnapshot {
        id: RoomId::new(room_id),
        name: room_name.to_string(),
        description: "a quiet place".to_string(),
        exits: vec!["north".to_string()],
        players_present: vec![PresentActor { id: "alice".to_string(), name: "Alice".to_string(), in_combat: false }],
        npcs_present: Vec::new(),
        items_present: Vec::new(),
    }
}

pub struct NoopPlayers;
#[async_trait]
impl PlayerDirectoryPort for NoopPlayers {
    async fn resolve_in_room(&self, _room_id: &RoomId, _name_fragment: &str) -> Option<String> {
        None
    }
}

pub struct NoopItems;
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

pub struct NoopCombat;
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

#[derive(Default)]
pub struct RecordingMessenger {
    pub said: StdMutex<Vec<String>>,
    pub told: StdMutex<Vec<(String, String)>>,
}

#[async_trait]
impl SessionMessengerPort for RecordingMessenger {
    async fn tell(&self, target_player_id: &str, message: &str) {
        self.told.lock().unwrap().push((target_player_id.to_string(), message.to_string()));
    }
    async fn say_to_room(&self, _room_id: &RoomId, _exclude_actor_id: &str, message: &str) {
        self.said.lock().unwrap().push(message.to_string());
    }
}

pub struct NoopMovement;
#[async_trait]
impl NpcMovementPort for NoopMovement {
    async fn move_npc(&self, _npc_id: &NpcId, _from_room: &RoomId, _to_room: &RoomId) {}
}

pub struct NoopLocal;
#[async_trait]
impl LocalCommandPort for NoopLocal {
    async fn try_invoke(&self, _room_id: &RoomId, _command: &str, _args: &str) -> Option<Result<String, String>> {
        None
    }
}

pub struct NoopTraceSink;
#[async_trait]
impl TraceSinkPort for NoopTraceSink {
    async fn deliver(&self, _subscriber: loreweave_domain::SubscriberId, _event: &loreweave_shared::TraceEvent) {}
}
