//! Job entity — one asynchronous PDF-processing request (spec.md §3 Job).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value_objects::{JobId, ProcessingSettings, UserId};

/// Default maximum retry rounds per Job (spec.md §3, §6).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Lifecycle state of a Job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, not yet started by the orchestrator.
    Pending,
    /// Orchestrator has dispatched chunk work.
    Processing,
    /// All chunks succeeded.
    Completed,
    /// Some chunks succeeded, some permanently failed.
    Partial,
    /// No chunk succeeded.
    Failed,
    /// User-cancelled.
    Cancelled,
}

impl JobState {
    /// Terminal states: `completed`, `partial`, `failed`, `cancelled`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Partial | Self::Failed | Self::Cancelled
        )
    }
}

/// One asynchronous PDF-processing request and its durable lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier.
    pub id: JobId,
    /// Owning user.
    pub owner: UserId,
    /// Original uploaded filename.
    pub original_filename: String,
    /// User-controlled processing settings.
    pub settings: ProcessingSettings,
    /// Current lifecycle state.
    pub state: JobState,
    /// Progress percent in `[0, 100]`.
    pub progress_percent: u8,
    /// Human-readable current-step label.
    pub current_step: String,
    /// Total number of Chunks persisted for this Job.
    pub total_chunks: u32,
    /// Number of Chunks that have reached a terminal per-chunk state.
    pub processed_chunks: u32,
    /// Current retry round, in `[0, max_retries]`.
    pub retry_round: u32,
    /// Maximum retry rounds allowed.
    pub max_retries: u32,
    /// When the Job was accepted.
    pub created_at: DateTime<Utc>,
    /// When the orchestrator first dispatched work.
    pub started_at: Option<DateTime<Utc>>,
    /// When the Job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Error summary, set on `failed`/`partial`.
    pub error_message: Option<String>,
    /// Id of the dispatched fan-out group (chord), if any.
    pub dispatch_group_id: Option<String>,
    /// Id of the finalizer task, if any.
    pub finalizer_task_id: Option<String>,
    /// Back-reference to the History snapshot created on first
    /// terminal-with-results transition.
    pub history_id: Option<crate::value_objects::HistoryId>,
    /// Set when Chunk persistence failed at start and the orchestrator is
    /// running this Job in degraded (in-memory chunk) mode (spec.md §4.2).
    pub degraded_mode: bool,
}

impl Job {
    /// Create a new Job in `Pending` state.
    #[must_use]
    pub fn new(
        owner: UserId,
        original_filename: impl Into<String>,
        settings: ProcessingSettings,
    ) -> Self {
        Self {
            id: JobId::new(),
            owner,
            original_filename: original_filename.into(),
            settings,
            state: JobState::Pending,
            progress_percent: 0,
            current_step: "Queued".to_owned(),
            total_chunks: 0,
            processed_chunks: 0,
            retry_round: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
            dispatch_group_id: None,
            finalizer_task_id: None,
            history_id: None,
            degraded_mode: false,
        }
    }

    /// Transition `pending -> processing`. Fails with
    /// [`Error::invalid_transition`] if the Job is not pending
    /// (`JOB_ALREADY_TERMINAL` in spec.md §4.4 terms, widened to any
    /// non-pending state since `start` is only ever called once).
    pub fn begin_processing(&mut self, total_chunks: u32, dispatch_group_id: Option<String>) -> Result<()> {
        if self.state != JobState::Pending {
            return Err(Error::invalid_transition(format!(
                "job {} is not pending (state={:?})",
                self.id, self.state
            )));
        }
        self.state = JobState::Processing;
        self.total_chunks = total_chunks;
        self.started_at = Some(Utc::now());
        self.dispatch_group_id = dispatch_group_id;
        self.set_step("Processing");
        Ok(())
    }

    /// Advance progress. Progress is monotonic non-decreasing until terminal
    /// (spec.md §8 property 5); callers must not pass a lower percentage.
    pub fn advance_progress(&mut self, processed_chunks: u32, percent: u8, step: &str) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::invalid_transition(format!(
                "job {} is terminal, progress is immutable",
                self.id
            )));
        }
        if percent < self.progress_percent {
            return Err(Error::invalid_transition(
                "progress_percent must be monotonic non-decreasing".to_owned(),
            ));
        }
        if processed_chunks > self.total_chunks {
            return Err(Error::invalid_transition(
                "processed_chunks must not exceed total_chunks".to_owned(),
            ));
        }
        self.processed_chunks = processed_chunks;
        self.progress_percent = percent.min(100);
        self.set_step(step);
        Ok(())
    }

    /// Begin a new retry round (spec.md §4.4 `finalize`). Fails if the Job
    /// has exhausted `max_retries`.
    pub fn begin_retry_round(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::invalid_transition("job is terminal".to_owned()));
        }
        if self.retry_round >= self.max_retries {
            return Err(Error::invalid_transition(
                "max_retries exhausted for this job".to_owned(),
            ));
        }
        self.retry_round += 1;
        self.set_step(&format!("Retry round {}", self.retry_round));
        Ok(())
    }

    /// Finalize into a terminal state. `history_id` is the only field a
    /// terminal Job may still change afterwards (spec.md §3 invariant,
    /// §8 property 6).
    pub fn finalize(&mut self, state: JobState, error_message: Option<String>) -> Result<()> {
        if !state.is_terminal() {
            return Err(Error::invalid_argument(
                "finalize requires a terminal state".to_owned(),
            ));
        }
        if self.state.is_terminal() {
            return Err(Error::invalid_transition(format!(
                "job {} already terminal",
                self.id
            )));
        }
        let step = match state {
            JobState::Completed => "Completed",
            JobState::Partial => "Partial",
            JobState::Failed => "Failed",
            JobState::Cancelled => "Cancelled",
            JobState::Pending | JobState::Processing => unreachable!("checked above"),
        };
        self.state = state;
        self.completed_at = Some(Utc::now());
        self.error_message = error_message;
        self.set_step(step);
        if matches!(state, JobState::Completed | JobState::Partial) {
            self.progress_percent = 100;
        }
        Ok(())
    }

    /// Attach the History snapshot id — the one field allowed to change
    /// after the Job has gone terminal.
    pub fn attach_history(&mut self, history_id: crate::value_objects::HistoryId) {
        self.history_id = Some(history_id);
    }

    /// Reopen a terminal (non-cancelled) Job for a manual chunk retry
    /// (spec.md §6 `/jobs/{id}/chunks/retry`). Clears `completed_at` and
    /// puts the Job back in `processing` so `finalize` can re-run normally.
    pub fn reopen_for_retry(&mut self) -> Result<()> {
        if self.state == JobState::Cancelled {
            return Err(Error::invalid_transition(format!(
                "job {} is cancelled and cannot be retried",
                self.id
            )));
        }
        self.state = JobState::Processing;
        self.completed_at = None;
        self.set_step("Retrying (manual)");
        Ok(())
    }

    /// Cancel a pending or processing Job (spec.md §4.4 `cancel`).
    pub fn cancel(&mut self) -> Result<()> {
        if !matches!(self.state, JobState::Pending | JobState::Processing) {
            return Err(Error::invalid_transition(format!(
                "job {} cannot be cancelled from state {:?}",
                self.id, self.state
            )));
        }
        self.state = JobState::Cancelled;
        self.completed_at = Some(Utc::now());
        self.set_step("Cancelled");
        Ok(())
    }

    fn set_step(&mut self, step: &str) {
        self.current_step = step.to_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> Job {
        Job::new(UserId::new(), "book.pdf", ProcessingSettings::default())
    }

    #[test]
    fn begin_processing_requires_pending() {
        let mut job = new_job();
        job.begin_processing(2, None).unwrap();
        assert_eq!(job.state, JobState::Processing);
        assert!(job.begin_processing(2, None).is_err());
    }

    #[test]
    fn progress_must_be_monotonic() {
        let mut job = new_job();
        job.begin_processing(4, None).unwrap();
        job.advance_progress(2, 50, "working").unwrap();
        assert!(job.advance_progress(1, 25, "working").is_err());
        job.advance_progress(4, 75, "working").unwrap();
        assert_eq!(job.progress_percent, 75);
    }

    #[test]
    fn finalize_then_only_history_id_may_change() {
        let mut job = new_job();
        job.begin_processing(1, None).unwrap();
        job.finalize(JobState::Completed, None).unwrap();
        assert!(job.state.is_terminal());
        assert!(job.advance_progress(1, 100, "x").is_err());
        assert!(job.cancel().is_err());
        job.attach_history(crate::value_objects::HistoryId::new());
        assert!(job.history_id.is_some());
    }

    #[test]
    fn reopen_for_retry_puts_a_terminal_job_back_into_processing() {
        let mut job = new_job();
        job.begin_processing(1, None).unwrap();
        job.finalize(JobState::Partial, Some("1 of 2 chunks succeeded".to_owned())).unwrap();
        job.reopen_for_retry().unwrap();
        assert_eq!(job.state, JobState::Processing);
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn reopen_for_retry_rejects_cancelled_jobs() {
        let mut job = new_job();
        job.cancel().unwrap();
        assert!(job.reopen_for_retry().is_err());
    }

    #[test]
    fn cancel_allowed_only_while_active() {
        let mut job = new_job();
        job.cancel().unwrap();
        assert_eq!(job.state, JobState::Cancelled);
        let mut job2 = new_job();
        job2.begin_processing(1, None).unwrap();
        job2.finalize(JobState::Completed, None).unwrap();
        assert!(job2.cancel().is_err());
    }
}
