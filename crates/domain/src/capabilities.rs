//! Per-NPC capability bitmask.
//!
//! Grounded on the bitflag-based permission masks used for entity/component
//! capability checks in `finalverse-mutsea` (its `Cargo.toml` pulls in
//! `bitflags = "2.4"` for exactly this kind of per-object permission mask).

use bitflags::bitflags;

bitflags! {
    /// Which action kinds an NPC is permitted to perform. `can()` is a
    /// bitwise AND against a single required flag; the command executor
    /// refuses any action whose required capability is unset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NpcCapabilities: u32 {
        const CAN_SPEAK             = 1 << 0;
        const CAN_EMOTE             = 1 << 1;
        const CAN_ATTACK            = 1 << 2;
        const CAN_FLEE              = 1 << 3;
        const CAN_MANIPULATE_ITEMS  = 1 << 4;
        const CAN_TRADE             = 1 << 5;
        const CAN_FOLLOW            = 1 << 6;
        const CAN_WANDER            = 1 << 7;
        const CAN_USE_DOORS         = 1 << 8;
    }
}

impl NpcCapabilities {
    /// A mute, immobile-but-wandering beast: no speech, no trade, no doors.
    pub const ANIMAL: Self = Self::CAN_WANDER.union(Self::CAN_FLEE).union(Self::CAN_ATTACK);

    /// A fully social, mobile person.
    pub const HUMANOID: Self = Self::CAN_SPEAK
        .union(Self::CAN_EMOTE)
        .union(Self::CAN_ATTACK)
        .union(Self::CAN_FLEE)
        .union(Self::CAN_MANIPULATE_ITEMS)
        .union(Self::CAN_TRADE)
        .union(Self::CAN_FOLLOW)
        .union(Self::CAN_WANDER)
        .union(Self::CAN_USE_DOORS);

    /// An aggressive animal that doesn't flee.
    pub const BEAST: Self = Self::CAN_WANDER.union(Self::CAN_ATTACK);

    /// A stationary trader.
    pub const MERCHANT: Self = Self::CAN_SPEAK
        .union(Self::CAN_EMOTE)
        .union(Self::CAN_MANIPULATE_ITEMS)
        .union(Self::CAN_TRADE);

    /// Whether `flag` is permitted.
    pub fn can(&self, flag: Self) -> bool {
        self.contains(flag)
    }

    /// Human-readable name for each individual flag, in a stable order, for
    /// the action-inventory section of the prompt built by the context
    /// builder.
    pub fn describe_forbidden(&self) -> Vec<&'static str> {
        const ALL: &[(NpcCapabilities, &str)] = &[
            (
                NpcCapabilities::CAN_SPEAK,
                "You CANNOT speak — communicate only through sounds and body language",
            ),
            (
                NpcCapabilities::CAN_EMOTE,
                "You CANNOT emote or gesture expressively",
            ),
            (NpcCapabilities::CAN_ATTACK, "You CANNOT attack"),
            (NpcCapabilities::CAN_FLEE, "You CANNOT flee from combat"),
            (
                NpcCapabilities::CAN_MANIPULATE_ITEMS,
                "You CANNOT pick up, drop, or use items",
            ),
            (NpcCapabilities::CAN_TRADE, "You CANNOT trade"),
            (NpcCapabilities::CAN_FOLLOW, "You CANNOT follow others"),
            (NpcCapabilities::CAN_WANDER, "You CANNOT move between rooms"),
            (NpcCapabilities::CAN_USE_DOORS, "You CANNOT open or use doors"),
        ];
        ALL.iter()
            .filter(|(flag, _)| !self.contains(*flag))
            .map(|(_, text)| *text)
            .collect()
    }
}
