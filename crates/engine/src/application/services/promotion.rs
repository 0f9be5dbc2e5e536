//! Promotion rules (§4.I): turn an observed room event into a candidate
//! episodic memory write for one observer NPC. Pure function — enqueuing
//! the result through the bounded writer is the caller's job.

use chrono::{Duration, Utc};

use loreweave_domain::{
    goal::normalize_player_name, MemoryId, NpcId, NpcMemoryWrite, RoomEvent, RoomId,
};

const CONVERSATION_TTL_DAYS: i64 = 7;

/// Everything promotion needs about the observer and the room it's
/// watching, beyond the event itself.
pub struct PromotionContext<'a> {
    pub observer_id: &'a NpcId,
    pub observer_aliases: &'a [String],
    pub room_id: &'a RoomId,
    /// Whether the event's actor is a recognized player (vs. scenery,
    /// an unowned container, or similar) — resolved by the player
    /// directory collaborator, not by this core.
    pub actor_is_player: bool,
    /// Count of living entities present in the room, used for the
    /// 1-on-1 "always directed" speech rule.
    pub living_entities_in_room: usize,
}

/// Map a `RoomEvent` kind to `(memory kind, importance)`. `ItemDropped`
/// stands in for the spec's `ItemGiven` — `RoomEvent` carries no distinct
/// "given" variant, only `ItemTaken`/`ItemDropped` (§3), so a drop onto a
/// recipient is promoted the same way a gift would be.
fn kind_and_importance(event: &RoomEvent) -> Option<(&'static str, i32)> {
    match event {
        RoomEvent::Speech { .. } => Some(("conversation", 30)),
        RoomEvent::ItemDropped { .. } => Some(("gift_received", 70)),
        RoomEvent::Combat { .. } => Some(("combat", 80)),
        RoomEvent::Death { .. } => Some(("witnessed_death", 90)),
        _ => None,
    }
}

fn speech_is_directed(message: &str, ctx: &PromotionContext<'_>) -> bool {
    if ctx.living_entities_in_room == 2 {
        return true;
    }
    let lowered = message.to_lowercase();
    ctx.observer_aliases
        .iter()
        .any(|alias| !alias.trim().is_empty() && lowered.contains(&alias.to_lowercase()))
}

/// Produce zero or one memory write candidate for `event`, as witnessed
/// by `ctx.observer_id`.
pub fn promote(event: &RoomEvent, ctx: &PromotionContext<'_>) -> Option<NpcMemoryWrite> {
    if event.actor_id() == ctx.observer_id.as_str() {
        return None;
    }
    if !ctx.actor_is_player {
        return None;
    }
    if let RoomEvent::Speech { message, .. } = event {
        if !speech_is_directed(message, ctx) {
            return None;
        }
    }

    let (kind, importance) = kind_and_importance(event)?;
    let content = event.narrate();
    let expires_at = (kind == "conversation").then(|| Utc::now() + Duration::days(CONVERSATION_TTL_DAYS));

    Some(NpcMemoryWrite {
        id: MemoryId::new(),
        npc_id: ctx.observer_id.clone(),
        subject: Some(normalize_player_name(event.actor_name())),
        room_id: Some(ctx.room_id.clone()),
        area_id: None,
        kind: kind.to_string(),
        importance,
        tags: vec![format!("room:{}", ctx.room_id.as_str())],
        content,
        expires_at,
        embedding: None,
    })
}
