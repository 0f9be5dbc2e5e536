//! World tick scheduler (§4.J): the one cooperative loop that owns the
//! world mutation timeline. No repo in the retrieval pack runs a
//! single-threaded MUD-style tick like this one, so this module has no
//! direct teacher file it generalizes (the same situation `need.rs` and
//! `capabilities.rs` were in) — its shape is grounded instead on the
//! teacher's background worker loops in `engine-runner/src/run/server.rs`:
//! a `tokio::select!` over a `CancellationToken`, `tracing` at each phase
//! boundary, and a sleep between iterations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use loreweave_domain::RoomId;

use crate::application::ports::world_ports::{CombatPort, SessionMessengerPort};
use crate::application::ports::{ConnectionAcceptorPort, PlayerCommandPort, SessionManagerPort, TickMetricsSink};

/// A named callback, invoked on a target object with string args.
/// Replaces the source's reflection-based "invoke method `name` on
/// `target`" dispatch (§9 REDESIGN FLAGS): handlers register under a
/// name up front instead of being looked up by runtime type reflection.
pub type Callback = Arc<dyn Fn(&str, &[String]) + Send + Sync>;

#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<String, Callback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Callback) {
        self.handlers.insert(name.into(), handler);
    }

    /// Returns `false` if no handler is registered under `name` — a
    /// scheduling bug (stale callout/heartbeat), not a normal outcome.
    fn invoke(&self, name: &str, target: &str, args: &[String]) -> bool {
        match self.handlers.get(name) {
            Some(handler) => {
                handler(target, args);
                true
            }
            None => false,
        }
    }
}

/// A periodic per-object callback (§4.J phase 2).
pub struct Heartbeat {
    pub target: String,
    pub callback_name: String,
    pub args: Vec<String>,
    pub interval: Duration,
    next_due: Instant,
}

impl Heartbeat {
    pub fn new(target: impl Into<String>, callback_name: impl Into<String>, args: Vec<String>, interval: Duration) -> Self {
        Self { target: target.into(), callback_name: callback_name.into(), args, interval, next_due: Instant::now() + interval }
    }
}

/// A one-shot, timestamped, named callback (§4.J phase 3).
pub struct Callout {
    pub target: String,
    pub callback_name: String,
    pub args: Vec<String>,
    pub due: Instant,
}

impl Callout {
    pub fn new(target: impl Into<String>, callback_name: impl Into<String>, args: Vec<String>, delay: Duration) -> Self {
        Self { target: target.into(), callback_name: callback_name.into(), args, due: Instant::now() + delay }
    }
}

#[derive(Debug, Clone)]
enum PendingMessage {
    Tell { target_player_id: String, message: String },
    Room { room_id: RoomId, exclude_actor_id: String, message: String },
}

/// Queued room/tell delivery with an optional synchronous fast path
/// (§4.J "async message delivery"). When `immediate` is set, enqueued
/// messages are written straight through instead of waiting for phase 6
/// — the path LLM-driven NPC speech uses so it appears without a tick's
/// delay.
pub struct MessageBus {
    messenger: Arc<dyn SessionMessengerPort>,
    immediate: bool,
    queue: Mutex<Vec<PendingMessage>>,
}

impl MessageBus {
    pub fn new(messenger: Arc<dyn SessionMessengerPort>, immediate: bool) -> Self {
        Self { messenger, immediate, queue: Mutex::new(Vec::new()) }
    }

    pub async fn tell(&self, target_player_id: impl Into<String>, message: impl Into<String>) {
        let msg = PendingMessage::Tell { target_player_id: target_player_id.into(), message: message.into() };
        if self.immediate {
            self.deliver(&msg).await;
        } else {
            self.queue.lock().await.push(msg);
        }
    }

    pub async fn say_to_room(
        &self, room_id: RoomId, exclude_actor_id: impl Into<String>, message: impl Into<String>,
    ) {
        let msg = PendingMessage::Room { room_id, exclude_actor_id: exclude_actor_id.into(), message: message.into() };
        if self.immediate {
            self.deliver(&msg).await;
        } else {
            self.queue.lock().await.push(msg);
        }
    }

    async fn deliver(&self, msg: &PendingMessage) {
        match msg {
            PendingMessage::Tell { target_player_id, message } => {
                self.messenger.tell(target_player_id, message).await;
            }
            PendingMessage::Room { room_id, exclude_actor_id, message } => {
                self.messenger.say_to_room(room_id, exclude_actor_id, message).await;
            }
        }
    }

    /// Phase 6: drain and deliver everything queued since the last tick.
    async fn drain(&self) {
        let pending = std::mem::take(&mut *self.queue.lock().await);
        for msg in &pending {
            self.deliver(msg).await;
        }
    }
}

/// Elapsed nanoseconds per phase, for the metrics sink (§4.J phase 8).
#[derive(Debug, Default, Clone)]
pub struct TickReport {
    pub accepted_connections: usize,
    pub heartbeats_fired: usize,
    pub callouts_fired: usize,
    pub deaths: Vec<String>,
    pub inputs_dispatched: usize,
    pub sessions_pruned: usize,
    pub phase_nanos: Vec<(&'static str, u64)>,
}

pub struct WorldTickScheduler {
    callbacks: CallbackRegistry,
    heartbeats: Mutex<Vec<Heartbeat>>,
    callouts: Mutex<Vec<Callout>>,
    acceptor: Arc<dyn ConnectionAcceptorPort>,
    sessions: Arc<dyn SessionManagerPort>,
    combat: Arc<dyn CombatPort>,
    commands: Arc<dyn PlayerCommandPort>,
    pub messages: Arc<MessageBus>,
    metrics: Arc<dyn TickMetricsSink>,
    loop_delay: Duration,
}

impl WorldTickScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        callbacks: CallbackRegistry,
        acceptor: Arc<dyn ConnectionAcceptorPort>,
        sessions: Arc<dyn SessionManagerPort>,
        combat: Arc<dyn CombatPort>,
        commands: Arc<dyn PlayerCommandPort>,
        messages: Arc<MessageBus>,
        metrics: Arc<dyn TickMetricsSink>,
        loop_delay: Duration,
    ) -> Self {
        Self {
            callbacks,
            heartbeats: Mutex::new(Vec::new()),
            callouts: Mutex::new(Vec::new()),
            acceptor,
            sessions,
            combat,
            commands,
            messages,
            metrics,
            loop_delay,
        }
    }

    pub async fn schedule_heartbeat(&self, heartbeat: Heartbeat) {
        self.heartbeats.lock().await.push(heartbeat);
    }

    pub async fn schedule_callout(&self, callout: Callout) {
        self.callouts.lock().await.push(callout);
    }

    async fn timed<T>(report: &mut Vec<(&'static str, u64)>, phase: &'static str, fut: impl std::future::Future<Output = T>) -> T {
        let start = Instant::now();
        let out = fut.await;
        report.push((phase, start.elapsed().as_nanos() as u64));
        out
    }

    /// Run exactly one tick: the 8 phases in §4.J order. No phase
    /// observes a later phase's side effects within the same tick.
    pub async fn run_tick(&self) -> TickReport {
        let mut phase_nanos = Vec::with_capacity(8);
        let mut report = TickReport::default();

        let accepted = Self::timed(&mut phase_nanos, "accept_connections", self.acceptor.accept_pending()).await;
        report.accepted_connections = accepted.len();

        let now = Instant::now();
        let due_heartbeats: Vec<(String, String, Vec<String>)> = {
            let mut heartbeats = self.heartbeats.lock().await;
            let mut due = Vec::new();
            for hb in heartbeats.iter_mut() {
                if hb.next_due <= now {
                    due.push((hb.target.clone(), hb.callback_name.clone(), hb.args.clone()));
                    hb.next_due = now + hb.interval;
                }
            }
            due
        };
        {
            let start = Instant::now();
            for (target, name, args) in &due_heartbeats {
                if self.callbacks.invoke(name, target, args) {
                    report.heartbeats_fired += 1;
                }
            }
            phase_nanos.push(("heartbeats", start.elapsed().as_nanos() as u64));
        }

        let due_callouts: Vec<(String, String, Vec<String>)> = {
            let mut callouts = self.callouts.lock().await;
            let now = Instant::now();
            let (due, pending): (Vec<_>, Vec<_>) = callouts.drain(..).partition(|c| c.due <= now);
            *callouts = pending;
            due.into_iter().map(|c| (c.target, c.callback_name, c.args)).collect()
        };
        {
            let start = Instant::now();
            for (target, name, args) in &due_callouts {
                if self.callbacks.invoke(name, target, args) {
                    report.callouts_fired += 1;
                }
            }
            phase_nanos.push(("callouts", start.elapsed().as_nanos() as u64));
        }

        report.deaths = Self::timed(&mut phase_nanos, "combat_round", self.combat.run_round()).await;

        {
            let start = Instant::now();
            let session_ids = self.sessions.connected_sessions().await;
            for session_id in &session_ids {
                if let Some(line) = self.sessions.poll_input(session_id).await {
                    let _events = self.commands.dispatch(session_id, &line).await;
                    report.inputs_dispatched += 1;
                }
            }
            phase_nanos.push(("dispatch_input", start.elapsed().as_nanos() as u64));
        }

        Self::timed(&mut phase_nanos, "deliver_messages", self.messages.drain()).await;

        report.sessions_pruned = Self::timed(&mut phase_nanos, "prune_disconnected", self.sessions.prune_disconnected()).await;

        for (phase, nanos) in &phase_nanos {
            self.metrics.record_phase_nanos(phase, *nanos);
        }
        report.phase_nanos = phase_nanos;
        report
    }

    /// Run ticks until `cancel` fires, sleeping `loop_delay` between
    /// each (§4.J phase 8, §5 "every async operation accepts a
    /// cancellation signal").
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                tracing::info!("world tick scheduler shutting down");
                break;
            }
            let report = self.run_tick().await;
            tracing::debug!(
                accepted = report.accepted_connections,
                heartbeats = report.heartbeats_fired,
                callouts = report.callouts_fired,
                deaths = report.deaths.len(),
                inputs = report.inputs_dispatched,
                pruned = report.sessions_pruned,
                "tick complete"
            );
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("world tick scheduler shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.loop_delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use loreweave_domain::RoomEvent;

    use super::*;

    struct NoopAcceptor;
    #[async_trait]
    impl ConnectionAcceptorPort for NoopAcceptor {
        async fn accept_pending(&self) -> Vec<String> {
            Vec::new()
        }
    }

    struct FakeSessions {
        ids: Vec<String>,
        line: Mutex<Option<String>>,
        pruned: AtomicUsize,
    }
    #[async_trait]
    impl SessionManagerPort for FakeSessions {
        async fn connected_sessions(&self) -> Vec<String> {
            self.ids.clone()
        }
        async fn poll_input(&self, _session_id: &str) -> Option<String> {
            self.line.lock().await.take()
        }
        async fn prune_disconnected(&self) -> usize {
            self.pruned.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    struct NoopCombat;
    #[async_trait]
    impl CombatPort for NoopCombat {
        async fn start_combat(&self, _attacker: &loreweave_domain::NpcId, _defender: &str) -> Result<(), String> {
            Ok(())
        }
        async fn is_in_combat(&self, _npc_id: &loreweave_domain::NpcId) -> bool {
            false
        }
        async fn end_combat(&self, _npc_id: &loreweave_domain::NpcId) {}
        async fn run_round(&self) -> Vec<String> {
            Vec::new()
        }
    }

    struct RecordingCommands {
        calls: AtomicUsize,
    }
    #[async_trait]
    impl PlayerCommandPort for RecordingCommands {
        async fn dispatch(&self, _session_id: &str, _line: &str) -> Vec<(RoomId, RoomEvent)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }
    }

    struct RecordingMessenger {
        told: Mutex<Vec<(String, String)>>,
    }
    #[async_trait]
    impl SessionMessengerPort for RecordingMessenger {
        async fn tell(&self, target_player_id: &str, message: &str) {
            self.told.lock().await.push((target_player_id.to_string(), message.to_string()));
        }
        async fn say_to_room(&self, _room_id: &RoomId, _exclude_actor_id: &str, _message: &str) {}
    }

    struct NoopMetrics;
    impl TickMetricsSink for NoopMetrics {
        fn record_phase_nanos(&self, _phase: &str, _nanos: u64) {}
    }

    fn scheduler(line: Option<&str>) -> (WorldTickScheduler, Arc<RecordingCommands>, Arc<RecordingMessenger>) {
        let commands = Arc::new(RecordingCommands { calls: AtomicUsize::new(0) });
        let messenger = Arc::new(RecordingMessenger { told: Mutex::new(Vec::new()) });
        let bus = Arc::new(MessageBus::new(messenger.clone(), false));
        let sched = WorldTickScheduler::new(
            CallbackRegistry::new(),
            Arc::new(NoopAcceptor),
            Arc::new(FakeSessions {
                ids: vec!["s1".to_string()],
                line: Mutex::new(line.map(String::from)),
                pruned: AtomicUsize::new(0),
            }),
            Arc::new(NoopCombat),
            commands.clone(),
            bus,
            Arc::new(NoopMetrics),
            Duration::from_millis(1),
        );
        (sched, commands, messenger)
    }

    #[tokio::test]
    async fn one_tick_dispatches_buffered_input_once() {
        let (sched, commands, _messenger) = scheduler(Some("look"));
        let report = sched.run_tick().await;
        assert_eq!(report.inputs_dispatched, 1);
        assert_eq!(commands.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tick_with_no_input_dispatches_nothing() {
        let (sched, commands, _messenger) = scheduler(None);
        let report = sched.run_tick().await;
        assert_eq!(report.inputs_dispatched, 0);
        assert_eq!(commands.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn due_heartbeat_fires_registered_callback() {
        let (mut sched, _commands, _messenger) = scheduler(None);
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        sched.callbacks.register("ping", Arc::new(move |_target: &str, _args: &[String]| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));
        sched.schedule_heartbeat(Heartbeat::new("npc:barnaby", "ping", vec![], Duration::from_millis(0))).await;
        let report = sched.run_tick().await;
        assert_eq!(report.heartbeats_fired, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn callout_fires_once_and_is_not_rescheduled() {
        let (mut sched, _commands, _messenger) = scheduler(None);
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        sched.callbacks.register("wake", Arc::new(move |_target: &str, _args: &[String]| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));
        sched.schedule_callout(Callout::new("npc:barnaby", "wake", vec![], Duration::from_millis(0))).await;
        let first = sched.run_tick().await;
        let second = sched.run_tick().await;
        assert_eq!(first.callouts_fired, 1);
        assert_eq!(second.callouts_fired, 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unregistered_callback_name_does_not_panic_or_count_as_fired() {
        let (mut sched, _commands, _messenger) = scheduler(None);
        sched.schedule_callout(Callout::new("npc:barnaby", "missing", vec![], Duration::from_millis(0))).await;
        let report = sched.run_tick().await;
        assert_eq!(report.callouts_fired, 0);
    }

    #[tokio::test]
    async fn message_bus_queues_until_drained_unless_immediate() {
        let messenger = Arc::new(RecordingMessenger { told: Mutex::new(Vec::new()) });
        let bus = MessageBus::new(messenger.clone(), false);
        bus.tell("alice", "hi").await;
        assert!(messenger.told.lock().await.is_empty());
        bus.drain().await;
        assert_eq!(messenger.told.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn message_bus_delivers_synchronously_when_immediate() {
        let messenger = Arc::new(RecordingMessenger { told: Mutex::new(Vec::new()) });
        let bus = MessageBus::new(messenger.clone(), true);
        bus.tell("alice", "hi").await;
        assert_eq!(messenger.told.lock().await.len(), 1);
    }
}
