//! Application layer: ports (traits this core depends on) and services
//! (the logic built only against those ports, independent of any concrete
//! adapter).

pub mod cognition;
pub mod npc_profile;
pub mod npc_runtime;
pub mod ports;
pub mod scheduler;
pub mod services;

pub use cognition::{CognitionPipeline, TurnOutcome};
pub use npc_profile::{DefaultGoalTemplate, NeedGoalMapping, NpcProfile, ShopProfile};
pub use npc_runtime::NpcRuntimeRegistry;
pub use scheduler::{Callback, CallbackRegistry, Callout, Heartbeat, MessageBus, TickReport, WorldTickScheduler};
