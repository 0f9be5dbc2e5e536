//! `NpcNeedStore` (§4.A/§6): per-NPC drive rows keyed by `(npc_id,
//! need_type)`. The `survive` drive is never a row here either — it is
//! synthesized at level 1 on every read that needs it (§4.G).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use loreweave_domain::{
    need::{is_survive_need_type, NeedStatus},
    NpcId, NpcNeed,
};

pub(super) async fn create_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS npc_needs (
            npc_id TEXT NOT NULL,
            need_type TEXT NOT NULL,
            level INTEGER NOT NULL,
            params TEXT NOT NULL,
            status TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (npc_id, need_type)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait]
pub trait NpcNeedStorePort: Send + Sync {
    async fn upsert(&self, need: NpcNeed);
    async fn get_all(&self, npc_id: &NpcId) -> Vec<NpcNeed>;
    async fn clear(&self, npc_id: &NpcId, need_type: &str);
}

pub struct SqliteNpcNeedStore {
    pool: SqlitePool,
}

impl SqliteNpcNeedStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn status_str(status: NeedStatus) -> &'static str {
    match status {
        NeedStatus::Active => "active",
        NeedStatus::Satisfied => "satisfied",
        NeedStatus::Suppressed => "suppressed",
    }
}

fn parse_status(s: &str) -> NeedStatus {
    match s {
        "satisfied" => NeedStatus::Satisfied,
        "suppressed" => NeedStatus::Suppressed,
        _ => NeedStatus::Active,
    }
}

fn row_to_need(row: sqlx::sqlite::SqliteRow) -> Option<NpcNeed> {
    let npc_id: String = row.try_get("npc_id").ok()?;
    let need_type: String = row.try_get("need_type").ok()?;
    let level: i32 = row.try_get("level").ok()?;
    let params_json: String = row.try_get("params").ok()?;
    let status_str: String = row.try_get("status").ok()?;
    let updated_at_str: String = row.try_get("updated_at").ok()?;

    Some(NpcNeed {
        npc_id: NpcId::new(npc_id),
        need_type,
        level,
        params: serde_json::from_str(&params_json).unwrap_or(serde_json::Value::Null),
        status: parse_status(&status_str),
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .ok()?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl NpcNeedStorePort for SqliteNpcNeedStore {
    async fn upsert(&self, mut need: NpcNeed) {
        if is_survive_need_type(&need.need_type) {
            tracing::warn!(npc_id = %need.npc_id, "refusing to persist synthetic survive need");
            return;
        }
        need.updated_at = Utc::now();
        let params_json = serde_json::to_string(&need.params).unwrap_or_else(|_| "null".to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO npc_needs (npc_id, need_type, level, params, status, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(npc_id, need_type) DO UPDATE SET
                level = excluded.level,
                params = excluded.params,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(need.npc_id.as_str())
        .bind(&need.need_type)
        .bind(need.level)
        .bind(params_json)
        .bind(status_str(need.status))
        .bind(need.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, npc_id = %need.npc_id, "need upsert failed");
        }
    }

    async fn get_all(&self, npc_id: &NpcId) -> Vec<NpcNeed> {
        let rows = sqlx::query("SELECT * FROM npc_needs WHERE npc_id = ?")
            .bind(npc_id.as_str())
            .fetch_all(&self.pool)
            .await;
        match rows {
            Ok(rows) => rows.into_iter().filter_map(row_to_need).collect(),
            Err(err) => {
                tracing::warn!(error = %err, npc_id = %npc_id, "need list query failed");
                Vec::new()
            }
        }
    }

    async fn clear(&self, npc_id: &NpcId, need_type: &str) {
        if let Err(err) = sqlx::query("DELETE FROM npc_needs WHERE npc_id = ? AND need_type = ?")
            .bind(npc_id.as_str())
            .bind(need_type)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = %err, npc_id = %npc_id, need_type, "need clear failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fresh_store() -> SqliteNpcNeedStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_table(&pool).await.unwrap();
        SqliteNpcNeedStore::new(pool)
    }

    #[tokio::test]
    async fn upsert_then_list_round_trips() {
        let store = fresh_store().await;
        store.upsert(NpcNeed::new(NpcId::new("barnaby"), "hunger", 40)).await;
        let all = store.get_all(&NpcId::new("barnaby")).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].level, 40);
    }

    #[tokio::test]
    async fn upsert_refuses_survive_need_type() {
        let store = fresh_store().await;
        store.upsert(NpcNeed::survive(NpcId::new("barnaby"))).await;
        assert!(store.get_all(&NpcId::new("barnaby")).await.is_empty());
    }

    #[tokio::test]
    async fn upsert_is_keyed_on_npc_and_need_type() {
        let store = fresh_store().await;
        store.upsert(NpcNeed::new(NpcId::new("barnaby"), "hunger", 40)).await;
        store.upsert(NpcNeed::new(NpcId::new("barnaby"), "hunger", 70)).await;
        let all = store.get_all(&NpcId::new("barnaby")).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].level, 70);
    }

    #[tokio::test]
    async fn clear_removes_the_row() {
        let store = fresh_store().await;
        store.upsert(NpcNeed::new(NpcId::new("barnaby"), "hunger", 40)).await;
        store.clear(&NpcId::new("barnaby"), "hunger").await;
        assert!(store.get_all(&NpcId::new("barnaby")).await.is_empty());
    }
}
