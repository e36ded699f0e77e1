use async_trait::async_trait;
use lexi_domain::entities::{CoverageAssignment, CoverageRun};
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::CoverageRepository;
use lexi_domain::value_objects::CoverageRunId;
use sqlx::{Row, SqlitePool};

use super::row_to_json_error;

/// SQLite-backed [`CoverageRepository`]. Assignments are stored whole per
/// run (ordered by `position`) since coverage runs are rebuilt in full,
/// except for the one-row patch `swap` performs.
pub struct SqliteCoverageRepository {
    pool: SqlitePool,
}

impl SqliteCoverageRepository {
    /// Build a new repository over an already-migrated pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CoverageRepository for SqliteCoverageRepository {
    async fn insert_run(&self, run: &CoverageRun) -> Result<()> {
        let data = serde_json::to_string(run)?;
        sqlx::query("INSERT INTO coverage_runs (id, owner, data) VALUES (?, ?, ?)")
            .bind(run.id.to_string())
            .bind(run.owner.to_string())
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("insert coverage run", e))?;
        Ok(())
    }

    async fn get_run(&self, id: CoverageRunId) -> Result<CoverageRun> {
        let row = sqlx::query("SELECT data FROM coverage_runs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| row_to_json_error("fetch coverage run", e))?
            .ok_or_else(|| Error::not_found(format!("coverage run {id}")))?;
        let data: String = row.get("data");
        Ok(serde_json::from_str(&data)?)
    }

    async fn update_run(&self, run: &CoverageRun) -> Result<()> {
        let data = serde_json::to_string(run)?;
        let affected = sqlx::query("UPDATE coverage_runs SET owner = ?, data = ? WHERE id = ?")
            .bind(run.owner.to_string())
            .bind(data)
            .bind(run.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("update coverage run", e))?
            .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("coverage run {}", run.id)));
        }
        Ok(())
    }

    async fn replace_assignments(&self, run_id: CoverageRunId, assignments: &[CoverageAssignment]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| row_to_json_error("begin assignment replace", e))?;
        sqlx::query("DELETE FROM coverage_assignments WHERE run_id = ?")
            .bind(run_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| row_to_json_error("clear coverage assignments", e))?;
        for (position, assignment) in assignments.iter().enumerate() {
            let data = serde_json::to_string(assignment)?;
            sqlx::query("INSERT INTO coverage_assignments (run_id, position, data) VALUES (?, ?, ?)")
                .bind(run_id.to_string())
                .bind(position as i64)
                .bind(data)
                .execute(&mut *tx)
                .await
                .map_err(|e| row_to_json_error("insert coverage assignment", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| row_to_json_error("commit assignment replace", e))?;
        Ok(())
    }

    async fn list_assignments(&self, run_id: CoverageRunId, offset: u32, limit: u32) -> Result<Vec<CoverageAssignment>> {
        let rows = sqlx::query(
            "SELECT data FROM coverage_assignments WHERE run_id = ? ORDER BY position ASC LIMIT ? OFFSET ?",
        )
        .bind(run_id.to_string())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| row_to_json_error("list coverage assignments", e))?;
        rows.into_iter()
            .map(|row| {
                let data: String = row.get("data");
                Ok(serde_json::from_str(&data)?)
            })
            .collect()
    }
}
