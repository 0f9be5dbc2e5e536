//! Delivery port for the trace/debug fabric (component K). The fabric
//! itself owns subscription bookkeeping (`crate::infrastructure::trace`);
//! actually writing a line to an observer's socket is an external
//! collaborator's concern (§1 Non-goals: telnet/console front-ends), so
//! delivery is a trait the fabric calls into.

use async_trait::async_trait;

use loreweave_domain::SubscriberId;
use loreweave_shared::TraceEvent;

#[async_trait]
pub trait TraceSinkPort: Send + Sync {
    /// Fire-and-forget delivery to one subscriber. Must tolerate a
    /// disconnected subscriber without returning an error — the fabric
    /// never propagates delivery failure (§4.K).
    async fn deliver(&self, subscriber: SubscriberId, event: &TraceEvent);
}
