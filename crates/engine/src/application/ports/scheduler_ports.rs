//! Ports the world tick scheduler (§4.J) depends on for the phases it
//! does not own the implementation of: connection acceptance, session
//! pruning, and phase-timing metrics. Heartbeats and callouts are owned
//! in-process by the scheduler itself (see `crate::application::scheduler`)
//! since §9 asks for a portable named-callback registry rather than
//! reflection, not an external collaborator.

use async_trait::async_trait;

#[async_trait]
pub trait ConnectionAcceptorPort: Send + Sync {
    /// Non-blocking: returns newly accepted session ids, or an empty
    /// vec if none are pending (§4.J phase 1).
    async fn accept_pending(&self) -> Vec<String>;
}

#[async_trait]
pub trait SessionManagerPort: Send + Sync {
    /// Every currently connected session id.
    async fn connected_sessions(&self) -> Vec<String>;
    /// Read at most one buffered input line for `session_id`, if any
    /// (§4.J phase 5).
    async fn poll_input(&self, session_id: &str) -> Option<String>;
    /// Remove sessions that have disconnected since the last tick,
    /// returning how many were pruned (§4.J phase 7).
    async fn prune_disconnected(&self) -> usize;
}

/// The player-facing command registry (§4.J phase 5) — distinct from
/// `CommandExecutor`, which dispatches NPC-originated actions only.
/// Concrete adapters resolve `session_id` to a player and room, run the
/// verb table, and report back whatever room events the command raised
/// so the scheduler can fan them out to NPC promotion/cognition.
#[async_trait]
pub trait PlayerCommandPort: Send + Sync {
    async fn dispatch(
        &self,
        session_id: &str,
        line: &str,
    ) -> Vec<(loreweave_domain::RoomId, loreweave_domain::RoomEvent)>;
}

/// Where per-phase elapsed time (§4.J phase 8) is recorded. A no-op
/// implementation is fine in tests; production wires this to whatever
/// metrics backend the surrounding server uses.
pub trait TickMetricsSink: Send + Sync {
    fn record_phase_nanos(&self, phase: &str, nanos: u64);
}
