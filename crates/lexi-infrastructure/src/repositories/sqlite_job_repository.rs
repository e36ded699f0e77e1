use async_trait::async_trait;
use lexi_domain::entities::Job;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::JobRepository;
use lexi_domain::value_objects::{JobId, UserId};
use sqlx::{Row, SqlitePool};

use super::row_to_json_error;

/// SQLite-backed [`JobRepository`]: one JSON blob per row, `owner` and
/// `state` duplicated into indexed columns for lookups.
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    /// Build a new repository over an already-migrated pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn insert(&self, job: &Job) -> Result<()> {
        let data = serde_json::to_string(job)?;
        sqlx::query("INSERT INTO jobs (id, owner, state, data) VALUES (?, ?, ?, ?)")
            .bind(job.id.to_string())
            .bind(job.owner.to_string())
            .bind(job_state_label(job))
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("insert job", e))?;
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Job> {
        let row = sqlx::query("SELECT data FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| row_to_json_error("fetch job", e))?
            .ok_or_else(|| Error::not_found(format!("job {id}")))?;
        let data: String = row.get("data");
        Ok(serde_json::from_str(&data)?)
    }

    async fn update(&self, job: &Job) -> Result<()> {
        let data = serde_json::to_string(job)?;
        let affected = sqlx::query("UPDATE jobs SET owner = ?, state = ?, data = ? WHERE id = ?")
            .bind(job.owner.to_string())
            .bind(job_state_label(job))
            .bind(data)
            .bind(job.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| row_to_json_error("update job", e))?
            .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("job {}", job.id)));
        }
        Ok(())
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Job>> {
        let rows = sqlx::query("SELECT data FROM jobs WHERE owner = ? ORDER BY rowid DESC")
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| row_to_json_error("list jobs", e))?;
        rows.into_iter()
            .map(|row| {
                let data: String = row.get("data");
                Ok(serde_json::from_str(&data)?)
            })
            .collect()
    }
}

fn job_state_label(job: &Job) -> &'static str {
    use lexi_domain::entities::JobState;
    match job.state {
        JobState::Pending => "pending",
        JobState::Processing => "processing",
        JobState::Completed => "completed",
        JobState::Partial => "partial",
        JobState::Failed => "failed",
        JobState::Cancelled => "cancelled",
    }
}
