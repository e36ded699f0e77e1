use async_trait::async_trait;
use lexi_domain::entities::History;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::HistoryRepository;
use lexi_domain::value_objects::{HistoryId, JobId, UserId};
use sqlx::{Row, SqlitePool};

use super::row_to_json_error;

/// SQLite-backed [`HistoryRepository`].
pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    /// Build a new repository over an already-migrated pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn insert(&self, history: &History) -> Result<()> {
        let data = serde_json::to_string(history)?;
        sqlx::query("INSERT INTO history (id, job_id, owner, data) VALUES (?, ?, ?, ?)")
            .bind(history.id.to_string())
            .bind(history.job_id.to_string())
            .bind(history.owner.to_string())
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("insert history", e))?;
        Ok(())
    }

    async fn get(&self, id: HistoryId) -> Result<History> {
        let row = sqlx::query("SELECT data FROM history WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| row_to_json_error("fetch history", e))?
            .ok_or_else(|| Error::not_found(format!("history {id}")))?;
        let data: String = row.get("data");
        Ok(serde_json::from_str(&data)?)
    }

    async fn get_by_job(&self, job_id: JobId) -> Result<Option<History>> {
        let row = sqlx::query("SELECT data FROM history WHERE job_id = ?")
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| row_to_json_error("fetch history by job", e))?;
        row.map(|row| {
            let data: String = row.get("data");
            Ok(serde_json::from_str(&data)?)
        })
        .transpose()
    }

    async fn update(&self, history: &History) -> Result<()> {
        let data = serde_json::to_string(history)?;
        let affected = sqlx::query("UPDATE history SET owner = ?, data = ? WHERE id = ?")
            .bind(history.owner.to_string())
            .bind(data)
            .bind(history.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("update history", e))?
            .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("history {}", history.id)));
        }
        Ok(())
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<History>> {
        let rows = sqlx::query("SELECT data FROM history WHERE owner = ? ORDER BY rowid DESC")
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| row_to_json_error("list history", e))?;
        rows.into_iter()
            .map(|row| {
                let data: String = row.get("data");
                Ok(serde_json::from_str(&data)?)
            })
            .collect()
    }
}
