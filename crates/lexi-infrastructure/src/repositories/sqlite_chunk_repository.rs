use async_trait::async_trait;
use lexi_domain::entities::{Chunk, ChunkState};
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::ChunkRepository;
use lexi_domain::value_objects::{ChunkId, JobId};
use sqlx::{Row, SqlitePool};

use super::row_to_json_error;

/// SQLite-backed [`ChunkRepository`]. `with_lock` opens a `BEGIN
/// IMMEDIATE` transaction around the read-mutate-write cycle: SQLite
/// grants at most one writer a reserved lock at a time, so a concurrent
/// `with_lock` on the same row blocks until this one commits or rolls
/// back. That is coarser than row-level locking (the whole database is
/// briefly locked for writers), but chunk transitions are single
/// statements and short-lived, and the only invariant the orchestrator
/// needs is "exactly one winner per transition, others see the result".
pub struct SqliteChunkRepository {
    pool: SqlitePool,
}

impl SqliteChunkRepository {
    /// Build a new repository over an already-migrated pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn state_label(state: ChunkState) -> &'static str {
    match state {
        ChunkState::Pending => "pending",
        ChunkState::Processing => "processing",
        ChunkState::Success => "success",
        ChunkState::Failed => "failed",
        ChunkState::RetryScheduled => "retry_scheduled",
    }
}

#[async_trait]
impl ChunkRepository for SqliteChunkRepository {
    async fn insert_batch(&self, chunks: &[Chunk]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| row_to_json_error("begin chunk batch insert", e))?;
        for chunk in chunks {
            let data = serde_json::to_string(chunk)?;
            sqlx::query(
                "INSERT INTO chunks (id, job_id, chunk_index, state, updated_at, data) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(chunk.id.to_string())
            .bind(chunk.job_id.to_string())
            .bind(i64::from(chunk.chunk_index))
            .bind(state_label(chunk.state))
            .bind(chunk.updated_at.to_rfc3339())
            .bind(data)
            .execute(&mut *tx)
            .await
            .map_err(|e| row_to_json_error("insert chunk", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| row_to_json_error("commit chunk batch insert", e))?;
        Ok(())
    }

    async fn get(&self, id: ChunkId) -> Result<Chunk> {
        let row = sqlx::query("SELECT data FROM chunks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| row_to_json_error("fetch chunk", e))?
            .ok_or_else(|| Error::not_found(format!("chunk {id}")))?;
        let data: String = row.get("data");
        Ok(serde_json::from_str(&data)?)
    }

    async fn list_by_job(&self, job_id: JobId) -> Result<Vec<Chunk>> {
        let rows = sqlx::query("SELECT data FROM chunks WHERE job_id = ? ORDER BY chunk_index ASC")
            .bind(job_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| row_to_json_error("list chunks", e))?;
        rows.into_iter()
            .map(|row| {
                let data: String = row.get("data");
                Ok(serde_json::from_str(&data)?)
            })
            .collect()
    }

    async fn with_lock(
        &self,
        id: ChunkId,
        mutate: Box<dyn FnOnce(&mut Chunk) -> Result<()> + Send>,
    ) -> Result<Chunk> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| row_to_json_error("acquire chunk lock connection", e))?;
        let mut tx = sqlx::Connection::begin_with(&mut *conn, "BEGIN IMMEDIATE")
            .await
            .map_err(|e| row_to_json_error("begin immediate chunk lock", e))?;

        let row = sqlx::query("SELECT data FROM chunks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| row_to_json_error("fetch chunk for lock", e))?
            .ok_or_else(|| Error::not_found(format!("chunk {id}")))?;
        let data: String = row.get("data");
        let mut chunk: Chunk = serde_json::from_str(&data)?;

        mutate(&mut chunk)?;

        let new_data = serde_json::to_string(&chunk)?;
        sqlx::query("UPDATE chunks SET state = ?, updated_at = ?, data = ? WHERE id = ?")
            .bind(state_label(chunk.state))
            .bind(chunk.updated_at.to_rfc3339())
            .bind(new_data)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| row_to_json_error("update locked chunk", e))?;

        tx.commit()
            .await
            .map_err(|e| row_to_json_error("commit chunk lock", e))?;
        Ok(chunk)
    }

    async fn list_stuck_processing(&self, max_age: chrono::Duration) -> Result<Vec<Chunk>> {
        let cutoff = chrono::Utc::now() - max_age;
        let rows = sqlx::query("SELECT data FROM chunks WHERE state = 'processing' AND updated_at < ?")
            .bind(cutoff.to_rfc3339())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| row_to_json_error("list stuck chunks", e))?;
        rows.into_iter()
            .map(|row| {
                let data: String = row.get("data");
                Ok(serde_json::from_str(&data)?)
            })
            .collect()
    }
}
