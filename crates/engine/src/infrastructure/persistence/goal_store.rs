//! `NpcGoalStore` (§4.A/§6): per-NPC goal rows keyed by `(npc_id, goal_type)`.
//! The synthetic `survive` goal never lives here — it is derived, not
//! stored (§4.G).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use loreweave_domain::{
    goal::{importance, is_survive_goal_type, GoalPlan},
    NpcGoal, NpcId,
};

pub(super) async fn create_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS npc_goals (
            npc_id TEXT NOT NULL,
            goal_type TEXT NOT NULL,
            target_player TEXT,
            params TEXT NOT NULL,
            status TEXT NOT NULL,
            importance INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (npc_id, goal_type)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait]
pub trait NpcGoalStorePort: Send + Sync {
    async fn upsert(&self, goal: NpcGoal);
    async fn get(&self, npc_id: &NpcId, goal_type: &str) -> Option<NpcGoal>;
    async fn get_all(&self, npc_id: &NpcId) -> Vec<NpcGoal>;
    async fn update_params(&self, npc_id: &NpcId, goal_type: &str, params: serde_json::Value);
    async fn clear(&self, npc_id: &NpcId, goal_type: &str);
    /// Removes every stored goal for the NPC. `preserve_survival` is
    /// honored defensively even though `survive` is never persisted here.
    async fn clear_all(&self, npc_id: &NpcId, preserve_survival: bool);
}

pub struct SqliteNpcGoalStore {
    pool: SqlitePool,
}

impl SqliteNpcGoalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_goal(row: sqlx::sqlite::SqliteRow) -> Option<NpcGoal> {
    let npc_id: String = row.try_get("npc_id").ok()?;
    let goal_type: String = row.try_get("goal_type").ok()?;
    let target_player: Option<String> = row.try_get("target_player").ok().flatten();
    let params_json: String = row.try_get("params").ok()?;
    let status: String = row.try_get("status").ok()?;
    let importance: i32 = row.try_get("importance").ok()?;
    let updated_at_str: String = row.try_get("updated_at").ok()?;

    Some(NpcGoal {
        npc_id: NpcId::new(npc_id),
        goal_type,
        target_player,
        params: serde_json::from_str(&params_json).unwrap_or(serde_json::Value::Null),
        status,
        importance,
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .ok()?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl NpcGoalStorePort for SqliteNpcGoalStore {
    async fn upsert(&self, mut goal: NpcGoal) {
        if is_survive_goal_type(&goal.goal_type) {
            tracing::warn!(npc_id = %goal.npc_id, "refusing to persist synthetic survive goal");
            return;
        }
        goal.updated_at = Utc::now();
        let params_json = serde_json::to_string(&goal.params).unwrap_or_else(|_| "null".to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO npc_goals (npc_id, goal_type, target_player, params, status, importance, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(npc_id, goal_type) DO UPDATE SET
                target_player = excluded.target_player,
                params = excluded.params,
                status = excluded.status,
                importance = excluded.importance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(goal.npc_id.as_str())
        .bind(&goal.goal_type)
        .bind(&goal.target_player)
        .bind(params_json)
        .bind(&goal.status)
        .bind(goal.importance)
        .bind(goal.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, npc_id = %goal.npc_id, "goal upsert failed");
        }
    }

    async fn get(&self, npc_id: &NpcId, goal_type: &str) -> Option<NpcGoal> {
        if is_survive_goal_type(goal_type) {
            return None;
        }
        let row = sqlx::query("SELECT * FROM npc_goals WHERE npc_id = ? AND goal_type = ?")
            .bind(npc_id.as_str())
            .bind(goal_type)
            .fetch_optional(&self.pool)
            .await
            .ok()
            .flatten()?;
        row_to_goal(row)
    }

    async fn get_all(&self, npc_id: &NpcId) -> Vec<NpcGoal> {
        let rows = sqlx::query("SELECT * FROM npc_goals WHERE npc_id = ?")
            .bind(npc_id.as_str())
            .fetch_all(&self.pool)
            .await;
        match rows {
            Ok(rows) => rows.into_iter().filter_map(row_to_goal).collect(),
            Err(err) => {
                tracing::warn!(error = %err, npc_id = %npc_id, "goal list query failed");
                Vec::new()
            }
        }
    }

    async fn update_params(&self, npc_id: &NpcId, goal_type: &str, params: serde_json::Value) {
        let params_json = serde_json::to_string(&params).unwrap_or_else(|_| "null".to_string());
        let result = sqlx::query(
            "UPDATE npc_goals SET params = ?, updated_at = ? WHERE npc_id = ? AND goal_type = ?",
        )
        .bind(params_json)
        .bind(Utc::now().to_rfc3339())
        .bind(npc_id.as_str())
        .bind(goal_type)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, npc_id = %npc_id, goal_type, "goal params update failed");
        }
    }

    async fn clear(&self, npc_id: &NpcId, goal_type: &str) {
        if let Err(err) = sqlx::query("DELETE FROM npc_goals WHERE npc_id = ? AND goal_type = ?")
            .bind(npc_id.as_str())
            .bind(goal_type)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = %err, npc_id = %npc_id, goal_type, "goal clear failed");
        }
    }

    async fn clear_all(&self, npc_id: &NpcId, _preserve_survival: bool) {
        if let Err(err) = sqlx::query("DELETE FROM npc_goals WHERE npc_id = ?")
            .bind(npc_id.as_str())
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = %err, npc_id = %npc_id, "goal clear_all failed");
        }
    }
}

/// Helper used by the goal/plan manager to attach a plan's JSON
/// representation into a goal's `params` before `upsert`.
pub fn with_plan(mut goal: NpcGoal, plan: &GoalPlan) -> NpcGoal {
    goal.params = plan.merge_into_params(goal.params);
    goal
}
