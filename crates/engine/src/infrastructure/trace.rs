//! Trace/debug fabric (§4.K): subscription bookkeeping for per-NPC
//! categorized trace events, fanned out to whichever observer sessions
//! subscribed to the emitting NPC. Delivery itself is a collaborator's
//! concern ([`TraceSinkPort`]); this type only owns the subscription sets
//! and the fan-out loop.
//!
//! Grounded on the teacher's session/subscription registries (e.g.
//! `infrastructure::session::SessionRegistry`): a single lock guarding both
//! directions of a bidirectional id map, never a global world lock.

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;

use loreweave_domain::{NpcId, SubscriberId};
use loreweave_shared::{TraceCategory, TraceEvent};

use crate::application::ports::TraceSinkPort;

#[derive(Default)]
struct Subscriptions {
    npc_to_subscribers: HashMap<NpcId, HashSet<SubscriberId>>,
    subscriber_to_npcs: HashMap<SubscriberId, HashSet<NpcId>>,
}

/// The per-NPC trace fan-out registry. One instance is shared for the
/// whole engine, injected with whatever [`TraceSinkPort`] delivers an
/// event to a subscriber's socket.
pub struct TraceFabric {
    sink: std::sync::Arc<dyn TraceSinkPort>,
    subs: Mutex<Subscriptions>,
}

impl TraceFabric {
    pub fn new(sink: std::sync::Arc<dyn TraceSinkPort>) -> Self {
        Self { sink, subs: Mutex::new(Subscriptions::default()) }
    }

    pub async fn subscribe(&self, subscriber: SubscriberId, npc_id: NpcId) {
        let mut subs = self.subs.lock().await;
        subs.npc_to_subscribers.entry(npc_id.clone()).or_default().insert(subscriber);
        subs.subscriber_to_npcs.entry(subscriber).or_default().insert(npc_id);
    }

    pub async fn unsubscribe(&self, subscriber: SubscriberId, npc_id: &NpcId) {
        let mut subs = self.subs.lock().await;
        if let Some(set) = subs.npc_to_subscribers.get_mut(npc_id) {
            set.remove(&subscriber);
            if set.is_empty() {
                subs.npc_to_subscribers.remove(npc_id);
            }
        }
        if let Some(set) = subs.subscriber_to_npcs.get_mut(&subscriber) {
            set.remove(npc_id);
            if set.is_empty() {
                subs.subscriber_to_npcs.remove(&subscriber);
            }
        }
    }

    /// Detach one subscriber from every NPC it watches. O(its current
    /// set), not O(every NPC) — it walks only the npcs this subscriber is
    /// attached to, via the reverse index.
    pub async fn unsubscribe_all(&self, subscriber: SubscriberId) {
        let mut subs = self.subs.lock().await;
        let Some(npcs) = subs.subscriber_to_npcs.remove(&subscriber) else {
            return;
        };
        for npc_id in npcs {
            if let Some(set) = subs.npc_to_subscribers.get_mut(&npc_id) {
                set.remove(&subscriber);
                if set.is_empty() {
                    subs.npc_to_subscribers.remove(&npc_id);
                }
            }
        }
    }

    /// Fire-and-forget delivery to every current subscriber of `npc_id`.
    /// Tolerates zero subscribers (no-op) and never propagates a
    /// delivery failure — that contract lives in [`TraceSinkPort`].
    pub async fn emit(&self, npc_id: &NpcId, category: TraceCategory, message: impl Into<String>) {
        let event = TraceEvent::new(npc_id.clone(), category, message);
        let targets: Vec<SubscriberId> = {
            let subs = self.subs.lock().await;
            subs.npc_to_subscribers.get(npc_id).map(|s| s.iter().copied().collect()).unwrap_or_default()
        };
        for subscriber in targets {
            self.sink.deliver(subscriber, &event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink {
        count: AtomicUsize,
    }

    #[async_trait]
    impl TraceSinkPort for CountingSink {
        async fn deliver(&self, _subscriber: SubscriberId, _event: &TraceEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn emit_reaches_every_subscriber_of_the_npc() {
        let sink = Arc::new(CountingSink { count: AtomicUsize::new(0) });
        let fabric = TraceFabric::new(sink.clone());
        let npc = NpcId::new("barnaby");
        fabric.subscribe(SubscriberId::new(), npc.clone()).await;
        fabric.subscribe(SubscriberId::new(), npc.clone()).await;
        fabric.emit(&npc, TraceCategory::Cmd, "tried to flee").await;
        assert_eq!(sink.count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn emit_with_no_subscribers_is_a_silent_no_op() {
        let sink = Arc::new(CountingSink { count: AtomicUsize::new(0) });
        let fabric = TraceFabric::new(sink.clone());
        fabric.emit(&NpcId::new("wolf"), TraceCategory::Event, "howls").await;
        assert_eq!(sink.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsubscribe_all_detaches_from_every_watched_npc() {
        let sink = Arc::new(CountingSink { count: AtomicUsize::new(0) });
        let fabric = TraceFabric::new(sink.clone());
        let subscriber = SubscriberId::new();
        fabric.subscribe(subscriber, NpcId::new("a")).await;
        fabric.subscribe(subscriber, NpcId::new("b")).await;
        fabric.unsubscribe_all(subscriber).await;
        fabric.emit(&NpcId::new("a"), TraceCategory::Goal, "x").await;
        fabric.emit(&NpcId::new("b"), TraceCategory::Goal, "x").await;
        assert_eq!(sink.count.load(Ordering::SeqCst), 0);
    }
}
