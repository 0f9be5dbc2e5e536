//! Relational persistence for the three memory-store tables (§6 Database
//! schema). SQLite-backed, via `sqlx`, following the teacher's
//! `engine-adapters` repositories (`CREATE TABLE IF NOT EXISTS` bootstrap
//! on construction, `sqlx::query(...).bind(...).execute/fetch_all`).

mod goal_store;
mod knowledge_base;
mod memory_store;
mod need_store;

pub use goal_store::{NpcGoalStorePort, SqliteNpcGoalStore};
pub use knowledge_base::{SqliteWorldKnowledgeBase, WorldKnowledgeBasePort};
pub use memory_store::{NpcMemoryStorePort, SqliteMemoryStore};
pub use need_store::{NpcNeedStorePort, SqliteNpcNeedStore};

use sqlx::SqlitePool;

/// Whether schema bootstrap activated vector support. Always `false` for
/// the SQLite adapter — the optional vector column/index (§4.A schema
/// bootstrap, §6 "Optional vector column") is a Postgres/pgvector
/// extension point this adapter does not implement; recall degrades to
/// the non-vector fallback ordering in that case, exactly as §4.A
/// specifies for when vectors are unavailable.
#[derive(Debug, Clone, Copy)]
pub struct SchemaBootstrapReport {
    pub vector_support_activated: bool,
}

/// Create all three tables if absent. Safe to call on every startup.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<SchemaBootstrapReport, sqlx::Error> {
    memory_store::create_table(pool).await?;
    knowledge_base::create_table(pool).await?;
    goal_store::create_table(pool).await?;
    need_store::create_table(pool).await?;
    tracing::info!("memory store schema bootstrap complete");
    Ok(SchemaBootstrapReport { vector_support_activated: false })
}
