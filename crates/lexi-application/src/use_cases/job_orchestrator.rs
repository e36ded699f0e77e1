//! Job Orchestrator (C4): the central state machine binding Chunks, the
//! Retry Engine, the Task Dispatcher, and the Progress Bus (spec.md §4.4).

use std::sync::Arc;

use lexi_domain::entities::{Chunk, ChunkState, Job, JobState};
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::{ChunkRepository, HistoryRepository, JobRepository};
use lexi_domain::ports::services::{
    PdfPageExtractor, ProgressEvent, ProgressPublisher, TaskDispatcher, TaskOutcome, TaskPayload,
};
use lexi_domain::value_objects::JobId;

use crate::history_service::build_history_snapshot;
use crate::merge::merge_chunks_default;
use crate::use_cases::retry_engine::process_chunk_text;

/// Settings that come from ambient configuration rather than the Job
/// (spec.md §6 recognized configuration options).
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// If false, the Retry Engine's tier 4 (local fallback) is disabled.
    pub allow_local_fallback: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            allow_local_fallback: true,
        }
    }
}

/// The Job Orchestrator, C4.
pub struct JobOrchestrator {
    job_repo: Arc<dyn JobRepository>,
    chunk_repo: Arc<dyn ChunkRepository>,
    history_repo: Arc<dyn HistoryRepository>,
    dispatcher: Arc<dyn TaskDispatcher>,
    progress: Arc<dyn ProgressPublisher>,
    pdf_extractor: Arc<dyn PdfPageExtractor>,
    llm: Arc<dyn lexi_domain::ports::services::LlmClient>,
    config: OrchestratorConfig,
}

impl JobOrchestrator {
    /// Build a new orchestrator from its collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        chunk_repo: Arc<dyn ChunkRepository>,
        history_repo: Arc<dyn HistoryRepository>,
        dispatcher: Arc<dyn TaskDispatcher>,
        progress: Arc<dyn ProgressPublisher>,
        pdf_extractor: Arc<dyn PdfPageExtractor>,
        llm: Arc<dyn lexi_domain::ports::services::LlmClient>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            job_repo,
            chunk_repo,
            history_repo,
            dispatcher,
            progress,
            pdf_extractor,
            llm,
            config,
        }
    }

    /// `start(job_id)`: `pending -> processing`, dispatches one task per
    /// persisted Chunk as a fan-out group bound to `finalize` (spec.md
    /// §4.4). Returns the dispatched group id.
    pub async fn start(&self, job_id: JobId) -> Result<String> {
        let mut job = self.job_repo.get(job_id).await?;
        if job.state != JobState::Pending {
            return Err(Error::invalid_transition(format!(
                "JOB_ALREADY_TERMINAL: job {job_id} is not pending"
            )));
        }

        let chunks = self.chunk_repo.list_by_job(job_id).await?;
        if chunks.is_empty() {
            return Err(Error::invalid_argument("job has no chunks to dispatch"));
        }

        // Single-chunk case short-circuits in-process to avoid broker
        // overhead (spec.md §4.2).
        if chunks.len() == 1 {
            job.begin_processing(1, None)?;
            self.job_repo.update(&job).await?;
            self.emit_intermediate(&job).await;

            self.process_chunk(chunks[0].id, job_id).await.ok();
            self.finalize(job_id).await?;
            return Ok(String::new());
        }

        let group_id = format!("job-{job_id}-round-{}", job.retry_round);
        let tasks: Vec<TaskPayload> = chunks
            .iter()
            .map(|c| TaskPayload::ChunkProcess {
                chunk_id: c.id,
                job_id,
            })
            .collect();
        let callback = TaskPayload::JobFinalize { job_id };
        let dispatched_group = self
            .dispatcher
            .dispatch_group_with_callback(tasks, callback)
            .await?;

        job.begin_processing(chunks.len() as u32, Some(dispatched_group.clone()))?;
        self.job_repo.update(&job).await?;
        self.emit_intermediate(&job).await;

        Ok(dispatched_group)
    }

    /// Process one Chunk end-to-end: claim, run the Retry Engine, persist
    /// the outcome. Used both by the single-chunk short-circuit and by the
    /// dispatcher's worker path (via [`crate::task_executor::CompositeExecutor`]).
    pub async fn process_chunk(&self, chunk_id: lexi_domain::value_objects::ChunkId, job_id: JobId) -> Result<()> {
        let job = self.job_repo.get(job_id).await?;
        let chunk = self.chunk_repo.get(chunk_id).await?;

        let task_id = format!("chunk-{chunk_id}-attempt-{}", chunk.attempts + 1);
        let claimed = self
            .chunk_repo
            .with_lock(
                chunk_id,
                Box::new(move |c: &mut Chunk| c.claim(task_id.clone())),
            )
            .await?;

        let text = self.pdf_extractor.payload_to_text(&claimed.payload).await?;
        let outcome = process_chunk_text(&text, &job.settings, &self.llm, self.config.allow_local_fallback).await;

        match outcome {
            Ok(retry_outcome) => {
                let result = lexi_domain::entities::ChunkResult {
                    sentences: retry_outcome.sentences,
                    token_count: text.split_whitespace().count() as u64,
                    start_page: claimed.start_page,
                    end_page: claimed.end_page,
                    fallback_marker: retry_outcome.fallback_marker.map(ToOwned::to_owned),
                };
                self.chunk_repo
                    .with_lock(chunk_id, Box::new(move |c: &mut Chunk| c.complete(result.clone())))
                    .await?;
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                self.chunk_repo
                    .with_lock(
                        chunk_id,
                        Box::new(move |c: &mut Chunk| c.fail(message.clone(), "RETRY_ENGINE_EXHAUSTED")),
                    )
                    .await?;
                Err(err)
            }
        }
    }

    /// `finalize(job_id, chunk_outcomes)`: invoked after a chord completes.
    /// `chunk_outcomes` are advisory — Chunks in the store are the source
    /// of truth (spec.md §4.4).
    pub async fn finalize(&self, job_id: JobId) -> Result<()> {
        self.finalize_with_outcomes(job_id, &[]).await
    }

    /// Finalize, given the dispatcher-delivered per-task outcomes (unused
    /// beyond logging — Chunks are re-read as the source of truth).
    pub async fn finalize_with_outcomes(&self, job_id: JobId, chunk_outcomes: &[TaskOutcome]) -> Result<()> {
        if !chunk_outcomes.is_empty() {
            tracing::debug!(count = chunk_outcomes.len(), "finalize received advisory task outcomes");
        }

        let mut job = self.job_repo.get(job_id).await?;
        if job.state.is_terminal() {
            // Cancellation raced the chord: nothing to finalize.
            return Ok(());
        }

        let mut chunks = self.chunk_repo.list_by_job(job_id).await?;
        chunks.sort_by_key(|c| c.chunk_index);

        let success_count = chunks.iter().filter(|c| c.state == ChunkState::Success).count();
        let retryable_failures: Vec<_> = chunks
            .iter()
            .filter(|c| c.eligible_for_auto_retry())
            .map(|c| c.id)
            .collect();

        if !retryable_failures.is_empty() && job.retry_round < job.max_retries {
            for chunk_id in &retryable_failures {
                let id = *chunk_id;
                self.chunk_repo
                    .with_lock(id, Box::new(move |c: &mut Chunk| c.schedule_retry()))
                    .await?;
            }
            job.begin_retry_round()?;
            self.job_repo.update(&job).await?;
            self.emit_intermediate(&job).await;

            let retry_chunks = self.chunk_repo.list_by_job(job_id).await?;
            let tasks: Vec<TaskPayload> = retry_chunks
                .into_iter()
                .filter(|c| retryable_failures.contains(&c.id))
                .map(|c| TaskPayload::ChunkProcess {
                    chunk_id: c.id,
                    job_id,
                })
                .collect();
            self.dispatcher
                .dispatch_group_with_callback(tasks, TaskPayload::JobFinalize { job_id })
                .await?;
            return Ok(());
        }

        let total = chunks.len();
        let state = if success_count == total {
            JobState::Completed
        } else if success_count > 0 {
            JobState::Partial
        } else {
            JobState::Failed
        };

        let error_message = if state == JobState::Completed {
            None
        } else {
            Some(format!("{} of {} chunks succeeded", success_count, total))
        };

        job.finalize(state, error_message.clone())?;

        if success_count > 0 {
            let merged = merge_chunks_default(&chunks);
            let history = build_history_snapshot(&job, &chunks, merged, error_message);
            self.history_repo.insert(&history).await?;
            job.attach_history(history.id);
        }

        self.job_repo.update(&job).await?;
        self.emit_terminal(&job).await;
        Ok(())
    }

    /// `cancel(job_id)`: allowed iff state ∈ {pending, processing}.
    pub async fn cancel(&self, job_id: JobId) -> Result<()> {
        let mut job = self.job_repo.get(job_id).await?;
        job.cancel()?;
        if let Some(group_id) = &job.dispatch_group_id {
            self.dispatcher.revoke(group_id, false).await.ok();
        }
        self.job_repo.update(&job).await?;
        self.emit_terminal(&job).await;
        Ok(())
    }

    async fn emit_intermediate(&self, job: &Job) {
        let event = ProgressEvent::intermediate(job);
        if let Err(err) = self.progress.publish(job.id, event).await {
            tracing::warn!(error = %err, job_id = %job.id, "failed to publish progress event");
        }
    }

    async fn emit_terminal(&self, job: &Job) {
        let event = ProgressEvent::terminal(job);
        if let Err(err) = self.progress.publish(job.id, event).await {
            tracing::warn!(error = %err, job_id = %job.id, "failed to publish terminal progress event");
        }
    }
}
