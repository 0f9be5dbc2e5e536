//! `WorldKnowledgeBase` (§4.A): upsertable semantic key/value store with
//! NPC-scoped visibility.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use loreweave_domain::{KbVisibility, NpcId, WorldKbEntry};

pub(super) async fn create_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS world_kb (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            tags TEXT NOT NULL,
            visibility TEXT NOT NULL,
            npc_ids TEXT,
            summary TEXT,
            embedding TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait]
pub trait WorldKnowledgeBasePort: Send + Sync {
    async fn upsert(&self, entry: WorldKbEntry);
    async fn get(&self, key: &str) -> Option<WorldKbEntry>;
    async fn search_by_tags(&self, tags: &[String], caller: Option<&NpcId>) -> Vec<WorldKbEntry>;
    /// Free-text search over `summary`/`value`, honoring the NPC-scoped
    /// visibility rule.
    async fn search(&self, text: &str, caller: Option<&NpcId>) -> Vec<WorldKbEntry>;
    async fn delete(&self, key: &str);
}

pub struct SqliteWorldKnowledgeBase {
    pool: SqlitePool,
}

impl SqliteWorldKnowledgeBase {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn all_entries(&self) -> Vec<WorldKbEntry> {
        let rows = match sqlx::query("SELECT * FROM world_kb").fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "world_kb scan failed");
                return Vec::new();
            }
        };
        rows.into_iter().filter_map(row_to_entry).collect()
    }
}

fn row_to_entry(row: sqlx::sqlite::SqliteRow) -> Option<WorldKbEntry> {
    let key: String = row.try_get("key").ok()?;
    let value_json: String = row.try_get("value").ok()?;
    let tags_json: String = row.try_get("tags").ok()?;
    let visibility_str: String = row.try_get("visibility").ok()?;
    let npc_ids_json: Option<String> = row.try_get("npc_ids").ok();
    let updated_at_str: String = row.try_get("updated_at").ok()?;

    let npc_ids: Option<HashSet<NpcId>> = npc_ids_json.and_then(|s| {
        serde_json::from_str::<HashSet<String>>(&s)
            .ok()
            .map(|ids| ids.into_iter().map(NpcId::new).collect())
    });

    Some(WorldKbEntry {
        key,
        value: serde_json::from_str(&value_json).unwrap_or(serde_json::Value::Null),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        visibility: match visibility_str.as_str() {
            "system" => KbVisibility::System,
            "npc" => KbVisibility::Npc,
            _ => KbVisibility::Public,
        },
        npc_ids,
        summary: row.try_get("summary").ok().flatten(),
        embedding: row
            .try_get::<Option<String>, _>("embedding")
            .ok()
            .flatten()
            .and_then(|s| serde_json::from_str(&s).ok()),
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .ok()?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl WorldKnowledgeBasePort for SqliteWorldKnowledgeBase {
    async fn upsert(&self, mut entry: WorldKbEntry) {
        entry.visibility = WorldKbEntry::visibility_for(&entry.npc_ids);
        entry.updated_at = Utc::now();

        let value_json = serde_json::to_string(&entry.value).unwrap_or_default();
        let tags_json = serde_json::to_string(&entry.tags).unwrap_or_else(|_| "[]".to_string());
        let visibility_str = match entry.visibility {
            KbVisibility::Public => "public",
            KbVisibility::System => "system",
            KbVisibility::Npc => "npc",
        };
        let npc_ids_json = entry.npc_ids.as_ref().and_then(|ids| {
            serde_json::to_string(&ids.iter().map(|i| i.as_str().to_string()).collect::<Vec<_>>())
                .ok()
        });
        let embedding_json = entry.embedding.as_ref().and_then(|e| serde_json::to_string(e).ok());

        let result = sqlx::query(
            r#"
            INSERT INTO world_kb (key, value, tags, visibility, npc_ids, summary, embedding, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                tags = excluded.tags,
                visibility = excluded.visibility,
                npc_ids = excluded.npc_ids,
                summary = excluded.summary,
                embedding = excluded.embedding,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.key)
        .bind(value_json)
        .bind(tags_json)
        .bind(visibility_str)
        .bind(npc_ids_json)
        .bind(&entry.summary)
        .bind(embedding_json)
        .bind(entry.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, key = %entry.key, "world_kb upsert failed");
        }
    }

    async fn get(&self, key: &str) -> Option<WorldKbEntry> {
        let row = sqlx::query("SELECT * FROM world_kb WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .ok()
            .flatten()?;
        row_to_entry(row)
    }

    async fn search_by_tags(&self, tags: &[String], caller: Option<&NpcId>) -> Vec<WorldKbEntry> {
        self.all_entries()
            .await
            .into_iter()
            .filter(|e| e.visible_to(caller))
            .filter(|e| tags.iter().any(|t| e.tags.contains(t)))
            .collect()
    }

    async fn search(&self, text: &str, caller: Option<&NpcId>) -> Vec<WorldKbEntry> {
        let needle = text.to_lowercase();
        self.all_entries()
            .await
            .into_iter()
            .filter(|e| e.visible_to(caller))
            .filter(|e| {
                e.summary
                    .as_ref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
                    || e.value.to_string().to_lowercase().contains(&needle)
                    || e.key.to_lowercase().contains(&needle)
            })
            .collect()
    }

    async fn delete(&self, key: &str) {
        if let Err(err) = sqlx::query("DELETE FROM world_kb WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = %err, key, "world_kb delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fresh_kb() -> SqliteWorldKnowledgeBase {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_table(&pool).await.unwrap();
        SqliteWorldKnowledgeBase::new(pool)
    }

    fn entry(key: &str, npc_ids: Option<HashSet<NpcId>>) -> WorldKbEntry {
        WorldKbEntry {
            key: key.to_string(),
            value: serde_json::json!({"text": "the mine collapsed"}),
            tags: HashSet::from(["rumor".to_string()]),
            visibility: WorldKbEntry::visibility_for(&npc_ids),
            npc_ids,
            summary: Some("mine collapse rumor".to_string()),
            embedding: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let kb = fresh_kb().await;
        kb.upsert(entry("tavern_rumor", None)).await;
        let got = kb.get("tavern_rumor").await.unwrap();
        assert_eq!(got.key, "tavern_rumor");
        assert_eq!(got.visibility, KbVisibility::Public);
    }

    #[tokio::test]
    async fn search_excludes_restricted_entries_without_matching_caller() {
        let kb = fresh_kb().await;
        let mut ids = HashSet::new();
        ids.insert(NpcId::new("barnaby"));
        kb.upsert(entry("secret", Some(ids))).await;

        let visible_to_barnaby = kb.search("mine", Some(&NpcId::new("barnaby"))).await;
        assert_eq!(visible_to_barnaby.len(), 1);

        let visible_to_nobody = kb.search("mine", None).await;
        assert!(visible_to_nobody.is_empty());
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_key() {
        let kb = fresh_kb().await;
        kb.upsert(entry("k", None)).await;
        let mut second = entry("k", None);
        second.summary = Some("updated".to_string());
        kb.upsert(second).await;

        let got = kb.get("k").await.unwrap();
        assert_eq!(got.summary.as_deref(), Some("updated"));
    }
}
