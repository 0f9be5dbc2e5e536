//! Core domain types for NPC cognition: the data model shared by every
//! engine component, free of I/O and of any dependency on a runtime.

pub mod capabilities;
pub mod clamp;
pub mod command_result;
pub mod common;
pub mod error;
pub mod goal;
pub mod ids;
pub mod knowledge;
pub mod memory;
pub mod need;
pub mod room_event;

pub use capabilities::NpcCapabilities;
pub use command_result::{CommandOutcome, CommandResult, CommandResultLog};
pub use error::DomainError;
pub use goal::{GoalPlan, NpcGoal};
pub use ids::{AreaId, MemoryId, NpcId, RoomId, SubscriberId};
pub use knowledge::{KbVisibility, WorldKbEntry};
pub use memory::{MemoryRecallQuery, NpcMemory, NpcMemoryWrite};
pub use need::{NeedStatus, NpcNeed};
pub use room_event::RoomEvent;
