pub mod llm_port;
pub mod scheduler_ports;
pub mod trace_port;
pub mod world_ports;

pub use llm_port::{ChatTurn, LlmPort, LlmProfile};
pub use scheduler_ports::{ConnectionAcceptorPort, PlayerCommandPort, SessionManagerPort, TickMetricsSink};
pub use trace_port::TraceSinkPort;
pub use world_ports::{
    CombatPort, ItemPort, LocalCommandPort, NpcMovementPort, PathingPort, PlayerDirectoryPort,
    PresentActor, RoomDirectoryPort, RoomSnapshot, SessionMessengerPort,
};
