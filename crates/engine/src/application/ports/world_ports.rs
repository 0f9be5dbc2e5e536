//! Trait ports standing in for the collaborators this core treats as
//! external (§1 Non-goals): room content, player directory, item/inventory
//! bookkeeping, combat resolution, pathing, and session message delivery.
//! Concrete adapters for these live outside this crate; the engine only
//! depends on the trait.

use async_trait::async_trait;

use loreweave_domain::{NpcId, RoomId};

#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub exits: Vec<String>,
    pub players_present: Vec<PresentActor>,
    pub npcs_present: Vec<PresentActor>,
    pub items_present: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PresentActor {
    pub id: String,
    pub name: String,
    pub in_combat: bool,
}

#[async_trait]
pub trait RoomDirectoryPort: Send + Sync {
    async fn snapshot(&self, room_id: &RoomId) -> Option<RoomSnapshot>;
    /// Lazily load a destination room across `exit_direction`, returning
    /// its id on success. `None` ⇒ "destination blocked" (§4.F movement
    /// safety).
    async fn load_destination(&self, room_id: &RoomId, exit_direction: &str) -> Option<RoomId>;
}

#[async_trait]
pub trait PlayerDirectoryPort: Send + Sync {
    /// Resolve a name/alias fragment to a player id co-located with `npc_id`.
    async fn resolve_in_room(&self, room_id: &RoomId, name_fragment: &str) -> Option<String>;
}

#[async_trait]
pub trait ItemPort: Send + Sync {
    /// Resolve an item by name/alias/short-description among the items
    /// currently reachable (room or inventory) for `npc_id`.
    async fn resolve_item(&self, npc_id: &NpcId, name_fragment: &str) -> Option<String>;
    async fn move_item(
        &self,
        item_id: &str,
        from_holder: &str,
        to_holder: &str,
    ) -> Result<(), String>;
    /// Whether `item_id` is in `npc_id`'s inventory, fuzzy-matched by
    /// name/short-description/alias against `name_fragment`.
    async fn inventory_contains(&self, npc_id: &NpcId, name_fragment: &str) -> bool;
}

#[async_trait]
pub trait CombatPort: Send + Sync {
    async fn start_combat(&self, attacker: &NpcId, defender: &str) -> Result<(), String>;
    async fn is_in_combat(&self, npc_id: &NpcId) -> bool;
    async fn end_combat(&self, npc_id: &NpcId);
    /// Run one combat round across every active pairing (§4.J phase 4),
    /// returning the ids of entities that died this round.
    async fn run_round(&self) -> Vec<String>;
}

#[async_trait]
pub trait PathingPort: Send + Sync {
    /// Next direction toward a room whose name fuzzy-matches `target_room_name`.
    async fn next_direction_toward(
        &self,
        from_room: &RoomId,
        target_room_name: &str,
    ) -> Option<String>;
}

#[async_trait]
pub trait SessionMessengerPort: Send + Sync {
    async fn tell(&self, target_player_id: &str, message: &str);
    /// Route to every session whose player is in `room_id` and isn't `exclude_actor_id`.
    async fn say_to_room(&self, room_id: &RoomId, exclude_actor_id: &str, message: &str);
}

/// Moves an NPC's position between rooms and runs linked-room spawn
/// processing (shops, storage) on arrival (§4.F movement safety). Kept
/// separate from [`RoomDirectoryPort`] because loading a destination
/// (a read) and committing a move (a world mutation) are different
/// concerns under §5's "no yield between world read and world write"
/// rule — callers hold both ports but call them back-to-back, not
/// interleaved with an await on anything else.
#[async_trait]
pub trait NpcMovementPort: Send + Sync {
    async fn move_npc(&self, npc_id: &NpcId, from_room: &RoomId, to_room: &RoomId);
}

/// Room-scoped local commands the content system defines (e.g. "draw" on
/// a well) — the §4.F "otherwise" verb-table row. `None` ⇒ no such local
/// command is defined in this room at all (distinct from a defined
/// command that fails, which is `Some(Err(..))`).
#[async_trait]
pub trait LocalCommandPort: Send + Sync {
    async fn try_invoke(
        &self,
        room_id: &RoomId,
        command: &str,
        args: &str,
    ) -> Option<Result<String, String>>;
}
