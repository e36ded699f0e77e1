//! Chunk entity — the durable unit of work for one Job (spec.md §3, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value_objects::{ChunkId, JobId};

/// Default maximum retry attempts per Chunk (spec.md §3).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Chunk lifecycle state (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkState {
    /// Created, not yet dispatched.
    Pending,
    /// Claimed by a worker.
    Processing,
    /// Terminal-ok: result is present and immutable.
    Success,
    /// Terminal-per-chunk unless retried: `attempts >= max_retries`.
    Failed,
    /// Scheduled for redispatch (automatic or manual retry).
    RetryScheduled,
}

impl ChunkState {
    /// Whether this is a terminal-per-chunk state for the current round
    /// (`success`, or `failed` with attempts exhausted is still `Failed`
    /// — callers must additionally check `attempts >= max_retries`).
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Location of a Chunk's page-range bytes: exactly one of payload or URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChunkPayload {
    /// Base64-encoded page-range bytes, stored inline.
    Inline(String),
    /// Reference to an object-store location.
    ExternalUrl(String),
}

/// Structured chunk-processing result (spec.md §3 Chunk.result).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Ordered sentences produced for this chunk (duplicates preserved).
    pub sentences: Vec<String>,
    /// Total tokens consumed producing this result.
    pub token_count: u64,
    /// First page covered.
    pub start_page: u32,
    /// Last page covered.
    pub end_page: u32,
    /// Fallback taxonomy marker, if any tier above 0 was used.
    pub fallback_marker: Option<String>,
}

/// The durable unit of work for one Job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier.
    pub id: ChunkId,
    /// Owning Job.
    pub job_id: JobId,
    /// 0-based index, unique within the owning Job.
    pub chunk_index: u32,
    /// First page, inclusive.
    pub start_page: u32,
    /// Last page, inclusive.
    pub end_page: u32,
    /// `end_page - start_page + 1`.
    pub page_count: u32,
    /// Whether this chunk's start page overlaps the previous chunk's end.
    pub has_overlap: bool,
    /// Page-range bytes, inline or by reference.
    pub payload: ChunkPayload,
    /// Size of the payload in bytes.
    pub file_size_bytes: u64,
    /// Current lifecycle state.
    pub state: ChunkState,
    /// Number of dispatch attempts so far.
    pub attempts: u32,
    /// Maximum retry attempts before requiring `force=true`.
    pub max_retries: u32,
    /// Last error message, if any.
    pub last_error: Option<String>,
    /// Last error's short symbolic code.
    pub last_error_code: Option<String>,
    /// Structured result, present and immutable once `state=success`.
    pub result: Option<ChunkResult>,
    /// Id of the task currently (or most recently) dispatched for this chunk.
    pub dispatched_task_id: Option<String>,
    /// When the worker finished processing (success or failed).
    pub processed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time — used by the stuck-processing watchdog.
    pub updated_at: DateTime<Utc>,
}

impl Chunk {
    /// Create a new pending Chunk (used by the PDF Chunker, C2).
    #[must_use]
    pub fn new_pending(
        job_id: JobId,
        chunk_index: u32,
        start_page: u32,
        end_page: u32,
        has_overlap: bool,
        payload: ChunkPayload,
        file_size_bytes: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ChunkId::new(),
            job_id,
            chunk_index,
            start_page,
            end_page,
            page_count: end_page.saturating_sub(start_page) + 1,
            has_overlap,
            payload,
            file_size_bytes,
            state: ChunkState::Pending,
            attempts: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            last_error: None,
            last_error_code: None,
            result: None,
            dispatched_task_id: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `pending|retry_scheduled -> processing` (worker claimed the chunk).
    pub fn claim(&mut self, task_id: impl Into<String>) -> Result<()> {
        if !matches!(self.state, ChunkState::Pending | ChunkState::RetryScheduled) {
            return Err(Error::invalid_transition(format!(
                "chunk {} cannot be claimed from state {:?}",
                self.id, self.state
            )));
        }
        self.attempts += 1;
        self.dispatched_task_id = Some(task_id.into());
        self.state = ChunkState::Processing;
        self.touch();
        Ok(())
    }

    /// `processing -> success`.
    pub fn complete(&mut self, result: ChunkResult) -> Result<()> {
        if self.state != ChunkState::Processing {
            return Err(Error::invalid_transition(format!(
                "chunk {} cannot complete from state {:?}",
                self.id, self.state
            )));
        }
        self.result = Some(result);
        self.last_error = None;
        self.last_error_code = None;
        self.processed_at = Some(Utc::now());
        self.state = ChunkState::Success;
        self.touch();
        Ok(())
    }

    /// `processing -> failed`.
    pub fn fail(&mut self, error: impl Into<String>, code: impl Into<String>) -> Result<()> {
        if self.state != ChunkState::Processing {
            return Err(Error::invalid_transition(format!(
                "chunk {} cannot fail from state {:?}",
                self.id, self.state
            )));
        }
        self.last_error = Some(error.into());
        self.last_error_code = Some(code.into());
        self.processed_at = Some(Utc::now());
        self.state = ChunkState::Failed;
        self.touch();
        Ok(())
    }

    /// `failed -> retry_scheduled`, automatic path: requires
    /// `attempts < max_retries`.
    pub fn schedule_retry(&mut self) -> Result<()> {
        self.schedule_retry_inner(false)
    }

    /// `failed -> retry_scheduled`, manual path: `force=true` bypasses the
    /// `attempts < max_retries` precondition (spec.md §6 manual retry).
    pub fn schedule_retry_forced(&mut self, force: bool) -> Result<()> {
        self.schedule_retry_inner(force)
    }

    fn schedule_retry_inner(&mut self, force: bool) -> Result<()> {
        if self.state != ChunkState::Failed {
            return Err(Error::invalid_transition(format!(
                "chunk {} cannot be retried from state {:?}",
                self.id, self.state
            )));
        }
        if !force && self.attempts >= self.max_retries {
            return Err(Error::invalid_transition(format!(
                "chunk {} exhausted retries ({} >= {})",
                self.id, self.attempts, self.max_retries
            )));
        }
        self.state = ChunkState::RetryScheduled;
        self.touch();
        Ok(())
    }

    /// Whether this chunk is eligible for an *automatic* retry round.
    #[must_use]
    pub fn eligible_for_auto_retry(&self) -> bool {
        self.state == ChunkState::Failed && self.attempts < self.max_retries
    }

    /// Watchdog sweep: a stuck `processing` chunk older than `max_age`
    /// transitions to `failed` with a timeout error (spec.md §4.5).
    pub fn reap_if_stuck(&mut self, max_age: chrono::Duration) -> Result<bool> {
        if self.state != ChunkState::Processing {
            return Ok(false);
        }
        if Utc::now() - self.updated_at < max_age {
            return Ok(false);
        }
        self.last_error = Some("worker timeout".to_owned());
        self.last_error_code = Some("WORKER_TIMEOUT".to_owned());
        self.processed_at = Some(Utc::now());
        self.state = ChunkState::Failed;
        self.touch();
        Ok(true)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ChunkPayload {
        ChunkPayload::Inline("YWJj".to_owned())
    }

    fn new_chunk() -> Chunk {
        Chunk::new_pending(JobId::new(), 0, 1, 20, false, payload(), 128)
    }

    #[test]
    fn happy_path_claim_complete() {
        let mut chunk = new_chunk();
        chunk.claim("task-1").unwrap();
        assert_eq!(chunk.attempts, 1);
        chunk
            .complete(ChunkResult {
                sentences: vec!["Il fait beau.".to_owned()],
                token_count: 10,
                start_page: 1,
                end_page: 20,
                fallback_marker: None,
            })
            .unwrap();
        assert!(chunk.state.is_success());
        assert!(chunk.result.is_some());
    }

    #[test]
    fn retry_requires_attempts_below_max_unless_forced() {
        let mut chunk = new_chunk();
        chunk.max_retries = 1;
        chunk.claim("t1").unwrap();
        chunk.fail("boom", "API_ERROR").unwrap();
        assert!(!chunk.eligible_for_auto_retry());
        assert!(chunk.schedule_retry().is_err());
        chunk.schedule_retry_forced(true).unwrap();
        assert_eq!(chunk.state, ChunkState::RetryScheduled);
    }

    #[test]
    fn claim_requires_pending_or_retry_scheduled() {
        let mut chunk = new_chunk();
        chunk.claim("t1").unwrap();
        assert!(chunk.claim("t2").is_err());
    }

    #[test]
    fn watchdog_reaps_stuck_processing() {
        let mut chunk = new_chunk();
        chunk.claim("t1").unwrap();
        chunk.updated_at = Utc::now() - chrono::Duration::minutes(61);
        let reaped = chunk.reap_if_stuck(chrono::Duration::minutes(60)).unwrap();
        assert!(reaped);
        assert_eq!(chunk.state, ChunkState::Failed);
        assert_eq!(chunk.last_error_code.as_deref(), Some("WORKER_TIMEOUT"));
    }
}
