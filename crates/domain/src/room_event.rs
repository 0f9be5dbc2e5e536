//! Events the world reports into a room, as seen by an NPC.

use serde::{Deserialize, Serialize};

/// A single observed happening in an NPC's current room, fed into the
/// context builder's recent-events window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoomEvent {
    Speech {
        actor_id: String,
        actor_name: String,
        message: String,
    },
    Emote {
        actor_id: String,
        actor_name: String,
        message: String,
    },
    Arrival {
        actor_id: String,
        actor_name: String,
        direction: Option<String>,
    },
    Departure {
        actor_id: String,
        actor_name: String,
        direction: Option<String>,
    },
    Combat {
        actor_id: String,
        actor_name: String,
        target: Option<String>,
        message: String,
    },
    ItemTaken {
        actor_id: String,
        actor_name: String,
        target: String,
    },
    ItemDropped {
        actor_id: String,
        actor_name: String,
        target: String,
    },
    Death {
        actor_id: String,
        actor_name: String,
    },
    Other {
        actor_id: String,
        actor_name: String,
        message: String,
    },
}

impl RoomEvent {
    pub fn actor_id(&self) -> &str {
        match self {
            RoomEvent::Speech { actor_id, .. }
            | RoomEvent::Emote { actor_id, .. }
            | RoomEvent::Arrival { actor_id, .. }
            | RoomEvent::Departure { actor_id, .. }
            | RoomEvent::Combat { actor_id, .. }
            | RoomEvent::ItemTaken { actor_id, .. }
            | RoomEvent::ItemDropped { actor_id, .. }
            | RoomEvent::Death { actor_id, .. }
            | RoomEvent::Other { actor_id, .. } => actor_id,
        }
    }

    pub fn actor_name(&self) -> &str {
        match self {
            RoomEvent::Speech { actor_name, .. }
            | RoomEvent::Emote { actor_name, .. }
            | RoomEvent::Arrival { actor_name, .. }
            | RoomEvent::Departure { actor_name, .. }
            | RoomEvent::Combat { actor_name, .. }
            | RoomEvent::ItemTaken { actor_name, .. }
            | RoomEvent::ItemDropped { actor_name, .. }
            | RoomEvent::Death { actor_name, .. }
            | RoomEvent::Other { actor_name, .. } => actor_name,
        }
    }

    /// A one-line rendering used to fill the context builder's recent
    /// events window, in the voice a narrating room would use.
    pub fn narrate(&self) -> String {
        match self {
            RoomEvent::Speech { actor_name, message, .. } => {
                format!("{actor_name} says, \"{message}\"")
            }
            RoomEvent::Emote { actor_name, message, .. } => format!("{actor_name} {message}"),
            RoomEvent::Arrival { actor_name, direction, .. } => match direction {
                Some(d) => format!("{actor_name} arrives from the {d}"),
                None => format!("{actor_name} arrives"),
            },
            RoomEvent::Departure { actor_name, direction, .. } => match direction {
                Some(d) => format!("{actor_name} leaves to the {d}"),
                None => format!("{actor_name} leaves"),
            },
            RoomEvent::Combat { actor_name, target, message, .. } => match target {
                Some(t) => format!("{actor_name} attacks {t}: {message}"),
                None => format!("{actor_name} fights: {message}"),
            },
            RoomEvent::ItemTaken { actor_name, target, .. } => {
                format!("{actor_name} picks up {target}")
            }
            RoomEvent::ItemDropped { actor_name, target, .. } => {
                format!("{actor_name} drops {target}")
            }
            RoomEvent::Death { actor_name, .. } => format!("{actor_name} dies"),
            RoomEvent::Other { actor_name, message, .. } => format!("{actor_name}: {message}"),
        }
    }
}
