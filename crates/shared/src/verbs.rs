//! Command-executor verb table (§4.F): which capability each verb
//! requires, and the alias spelling a player-authored or LLM-authored
//! command may use for it.

use serde::{Deserialize, Serialize};

use loreweave_domain::NpcCapabilities;

/// A supported command verb, independent of the particular alias spelling
/// the actor used to invoke it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandVerb {
    Say,
    Emote,
    Go,
    Get,
    Drop,
    Give,
    Equip,
    Unequip,
    Attack,
    Flee,
    Use,
    /// Falls through to a room-scoped local command lookup.
    Local,
}

impl CommandVerb {
    /// The capability the executor gates this verb on.
    pub fn required_capability(&self) -> NpcCapabilities {
        match self {
            CommandVerb::Say => NpcCapabilities::CAN_SPEAK,
            CommandVerb::Emote => NpcCapabilities::CAN_EMOTE,
            CommandVerb::Go => NpcCapabilities::CAN_WANDER,
            CommandVerb::Get | CommandVerb::Drop | CommandVerb::Give => {
                NpcCapabilities::CAN_MANIPULATE_ITEMS
            }
            CommandVerb::Equip | CommandVerb::Unequip => NpcCapabilities::CAN_MANIPULATE_ITEMS,
            CommandVerb::Attack => NpcCapabilities::CAN_ATTACK,
            CommandVerb::Flee => NpcCapabilities::CAN_FLEE,
            CommandVerb::Use => NpcCapabilities::CAN_MANIPULATE_ITEMS,
            CommandVerb::Local => NpcCapabilities::CAN_MANIPULATE_ITEMS,
        }
    }

    /// Resolve a free-form alias (already lowercased) to its verb, or
    /// `None` if it isn't one of the table's recognized aliases — callers
    /// treat an unrecognized alias as [`CommandVerb::Local`] rather than
    /// rejecting it outright, since §4.F's "otherwise" row looks up a
    /// room-scoped local command.
    pub fn from_alias(alias: &str) -> Option<Self> {
        Some(match alias {
            "say" => CommandVerb::Say,
            "emote" | "me" => CommandVerb::Emote,
            "go" | "n" | "s" | "e" | "w" | "u" | "d" | "north" | "south" | "east" | "west"
            | "up" | "down" => CommandVerb::Go,
            "get" | "take" => CommandVerb::Get,
            "drop" => CommandVerb::Drop,
            "give" => CommandVerb::Give,
            "equip" | "wield" | "wear" => CommandVerb::Equip,
            "unequip" | "remove" => CommandVerb::Unequip,
            "kill" | "attack" => CommandVerb::Attack,
            "flee" | "retreat" => CommandVerb::Flee,
            "use" | "drink" | "eat" => CommandVerb::Use,
            _ => return None,
        })
    }

    /// The compass direction implied by a movement alias, if any.
    pub fn direction_for_alias(alias: &str) -> Option<&'static str> {
        Some(match alias {
            "n" | "north" => "north",
            "s" | "south" => "south",
            "e" | "east" => "east",
            "w" | "west" => "west",
            "u" | "up" => "up",
            "d" | "down" => "down",
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn say_requires_can_speak() {
        assert_eq!(CommandVerb::Say.required_capability(), NpcCapabilities::CAN_SPEAK);
    }

    #[test]
    fn directional_aliases_resolve_to_go() {
        assert_eq!(CommandVerb::from_alias("n"), Some(CommandVerb::Go));
        assert_eq!(CommandVerb::from_alias("north"), Some(CommandVerb::Go));
    }

    #[test]
    fn unknown_alias_resolves_to_none_not_a_panic() {
        assert_eq!(CommandVerb::from_alias("dance"), None);
    }

    #[test]
    fn direction_for_alias_covers_short_and_long_forms() {
        assert_eq!(CommandVerb::direction_for_alias("n"), Some("north"));
        assert_eq!(CommandVerb::direction_for_alias("down"), Some("down"));
        assert_eq!(CommandVerb::direction_for_alias("say"), None);
    }
}
