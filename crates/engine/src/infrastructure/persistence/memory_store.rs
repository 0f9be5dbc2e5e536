//! `NpcMemoryStore` (§4.A): episodic per-NPC memory, two-stage recall.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use loreweave_domain::{
    clamp::{clamp_candidate_limit, clamp_top_k},
    DomainError, MemoryId, MemoryRecallQuery, NpcId, NpcMemory, NpcMemoryWrite,
};

pub(super) async fn create_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS npc_memories (
            id TEXT PRIMARY KEY,
            npc_id TEXT NOT NULL,
            subject_player TEXT,
            room_id TEXT,
            area_id TEXT,
            kind TEXT NOT NULL,
            importance INTEGER NOT NULL,
            tags TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT,
            embedding TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_npc_memories_npc_created ON npc_memories(npc_id, created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

#[async_trait]
pub trait NpcMemoryStorePort: Send + Sync {
    async fn add(&self, write: NpcMemoryWrite) -> Result<(), DomainError>;
    async fn recall(&self, query: MemoryRecallQuery) -> Vec<NpcMemory>;
}

pub struct SqliteMemoryStore {
    pool: SqlitePool,
}

impl SqliteMemoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_memory(row: sqlx::sqlite::SqliteRow) -> Option<NpcMemory> {
    let id: String = row.try_get("id").ok()?;
    let npc_id: String = row.try_get("npc_id").ok()?;
    let tags_json: String = row.try_get("tags").ok()?;
    let created_at_str: String = row.try_get("created_at").ok()?;
    let expires_at_str: Option<String> = row.try_get("expires_at").ok();
    let embedding_json: Option<String> = row.try_get("embedding").ok();

    Some(NpcMemory {
        id: MemoryId::from_uuid(id.parse().ok()?),
        npc_id: NpcId::new(npc_id),
        subject: row.try_get("subject_player").ok().flatten(),
        room_id: row
            .try_get::<Option<String>, _>("room_id")
            .ok()
            .flatten()
            .map(Into::into),
        area_id: row
            .try_get::<Option<String>, _>("area_id")
            .ok()
            .flatten()
            .map(Into::into),
        kind: row.try_get("kind").ok()?,
        importance: row.try_get("importance").ok()?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        content: row.try_get("content").ok()?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .ok()?
            .with_timezone(&Utc),
        expires_at: expires_at_str.and_then(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }),
        embedding: embedding_json.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

#[async_trait]
impl NpcMemoryStorePort for SqliteMemoryStore {
    async fn add(&self, write: NpcMemoryWrite) -> Result<(), DomainError> {
        let write = write.validated()?;
        let tags_json = serde_json::to_string(&write.tags).unwrap_or_else(|_| "[]".to_string());
        let embedding_json = write
            .embedding
            .as_ref()
            .and_then(|e| serde_json::to_string(e).ok());

        let result = sqlx::query(
            r#"
            INSERT INTO npc_memories
                (id, npc_id, subject_player, room_id, area_id, kind, importance, tags, content, created_at, expires_at, embedding)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(write.id.to_uuid().to_string())
        .bind(write.npc_id.as_str())
        .bind(write.subject)
        .bind(write.room_id.map(|r| r.as_str().to_string()))
        .bind(write.area_id.map(|a| a.as_str().to_string()))
        .bind(write.kind)
        .bind(write.importance)
        .bind(tags_json)
        .bind(write.content)
        .bind(Utc::now().to_rfc3339())
        .bind(write.expires_at.map(|e| e.to_rfc3339()))
        .bind(embedding_json)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, "memory insert failed");
        }
        Ok(())
    }

    async fn recall(&self, query: MemoryRecallQuery) -> Vec<NpcMemory> {
        let candidate_limit = clamp_candidate_limit(query.candidate_limit);
        let top_k = clamp_top_k(query.top_k);
        if top_k == 0 {
            return Vec::new();
        }

        // Subject is filtered in SQL so it narrows the set *before* the
        // candidate_limit cap below; tag overlap still needs the JSON
        // array decoded, so it's applied in memory, also before the cap
        // (§4.A stage 1 order: filters, then recency, then candidate_limit).
        let rows = sqlx::query(
            r#"
            SELECT * FROM npc_memories
            WHERE npc_id = ?
              AND (expires_at IS NULL OR expires_at > ?)
              AND (? IS NULL OR subject_player = ?)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.npc_id.as_str())
        .bind(query.as_of.to_rfc3339())
        .bind(query.subject.clone())
        .bind(query.subject.clone())
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "memory recall query failed");
                return Vec::new();
            }
        };

        let mut candidates: Vec<NpcMemory> = rows.into_iter().filter_map(row_to_memory).collect();

        if !query.tags.is_empty() {
            candidates.retain(|m| query.tags.iter().any(|t| m.tags.contains(t)));
        }
        candidates.truncate(candidate_limit);

        // Vector reranking is an optional extension point this SQLite
        // adapter does not implement; always fall back to
        // importance desc, then created desc (§4.A stage 2 fallback).
        candidates.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        candidates.truncate(top_k);
        candidates
    }
}
