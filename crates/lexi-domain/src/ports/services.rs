//! External-collaborator ports: seams the core orchestration treats as
//! black boxes (spec.md §1 "deliberately out of scope", §4.9, §4.6).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{ChunkPayload, ChunkResult, Job};
use crate::error::Result;
use crate::value_objects::{ChunkId, CoverageRunId, JobId, ModelTier, ProcessingSettings};

/// The two task kinds the orchestration core ever dispatches (spec.md §1
/// Non-goals: "exactly two task kinds").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskPayload {
    /// Process one Chunk through the LLM Retry Engine.
    ChunkProcess {
        /// The Chunk to process.
        chunk_id: ChunkId,
        /// The owning Job, for settings lookup.
        job_id: JobId,
    },
    /// Run a CoverageRun to completion.
    CoverageBuild {
        /// The CoverageRun to execute.
        run_id: CoverageRunId,
    },
    /// The fan-in callback for a chord of `ChunkProcess` tasks.
    JobFinalize {
        /// The Job whose chunks just completed a round.
        job_id: JobId,
    },
}

/// The outcome of one dispatched task, as delivered to a chord callback.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// The dispatcher-assigned task id.
    pub task_id: String,
    /// The payload that was executed.
    pub payload: TaskPayload,
    /// Whether the task succeeded.
    pub success: bool,
    /// Error message, if it failed.
    pub error: Option<String>,
}

/// Executes dispatched [`TaskPayload`]s. Implemented by the application
/// layer (the Job Orchestrator and Coverage Service) and registered with a
/// [`TaskDispatcher`] at bootstrap, so the dispatcher can remain a thin
/// broker adapter that never imports application use-cases directly.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute one task and return its outcome. Must not panic: any
    /// failure is reported via `TaskOutcome::error`.
    async fn execute(&self, payload: &TaskPayload) -> TaskOutcome;
}

/// Thin adapter binding the Job Orchestrator to a broker (C9, spec.md §4.9).
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Fire-and-track a single task. Returns its task id.
    async fn dispatch_single(&self, payload: TaskPayload) -> Result<String>;

    /// Chord primitive: dispatch `tasks` concurrently: `callback` is invoked
    /// exactly once when all of them have terminated (success or failure).
    /// Returns the group id.
    async fn dispatch_group_with_callback(
        &self,
        tasks: Vec<TaskPayload>,
        callback: TaskPayload,
    ) -> Result<String>;

    /// Best-effort cancellation of a dispatched (not yet completed) task.
    async fn revoke(&self, task_id: &str, terminate: bool) -> Result<()>;
}

/// Contract for the remote LLM used by the Retry Engine (C3). Implementers
/// are expected to be stateless per call; tier/model selection is the
/// caller's responsibility.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Request a full-prompt sentence extraction at the given model tier.
    async fn extract_sentences(
        &self,
        tier: ModelTier,
        chunk_text: &str,
        settings: &ProcessingSettings,
    ) -> Result<Vec<String>>;

    /// Request a minimal-prompt (extract-and-split only) pass, used by
    /// Retry Engine tier 3.
    async fn extract_sentences_minimal(
        &self,
        tier: ModelTier,
        chunk_text: &str,
    ) -> Result<Vec<String>>;
}

/// Contract for the PDF page-extraction library (C2's byte source).
#[async_trait]
pub trait PdfPageExtractor: Send + Sync {
    /// Total page count of the document.
    async fn page_count(&self, pdf_bytes: &[u8]) -> Result<u32>;

    /// Extract the byte range covering `start_page..=end_page` (1-based,
    /// inclusive) as a standalone payload.
    async fn extract_page_range(
        &self,
        pdf_bytes: &[u8],
        start_page: u32,
        end_page: u32,
    ) -> Result<ChunkPayload>;

    /// Render a chunk's payload back to plain text for LLM prompting.
    async fn payload_to_text(&self, payload: &ChunkPayload) -> Result<String>;
}

/// A room-scoped, authenticated push channel (Progress Bus, C6).
#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    /// Publish an intermediate or terminal progress event to room
    /// `job:{job_id}`. Implementations must preserve emit order per room.
    async fn publish(&self, job_id: JobId, event: ProgressEvent) -> Result<()>;
}

/// Payload delivered to Progress Bus subscribers (spec.md §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The Job this event is about.
    pub job_id: JobId,
    /// Current lifecycle state, as a string (`pending`, `processing`, ...).
    pub state: String,
    /// Progress percent in `[0, 100]`.
    pub progress_percent: u8,
    /// Human-readable current step.
    pub current_step: String,
    /// Chunks processed so far, for intermediate events.
    pub processed_chunks: Option<u32>,
    /// Total chunks, for intermediate events.
    pub total_chunks: Option<u32>,
    /// Full Job snapshot, present on terminal events.
    pub job_snapshot: Option<Job>,
}

impl ProgressEvent {
    /// Build an intermediate progress event from a Job.
    #[must_use]
    pub fn intermediate(job: &Job) -> Self {
        Self {
            job_id: job.id,
            state: job_state_label(job).to_owned(),
            progress_percent: job.progress_percent,
            current_step: job.current_step.clone(),
            processed_chunks: Some(job.processed_chunks),
            total_chunks: Some(job.total_chunks),
            job_snapshot: None,
        }
    }

    /// Build a terminal progress event carrying the full Job snapshot.
    #[must_use]
    pub fn terminal(job: &Job) -> Self {
        Self {
            job_id: job.id,
            state: job_state_label(job).to_owned(),
            progress_percent: job.progress_percent,
            current_step: job.current_step.clone(),
            processed_chunks: Some(job.processed_chunks),
            total_chunks: Some(job.total_chunks),
            job_snapshot: Some(job.clone()),
        }
    }
}

fn job_state_label(job: &Job) -> &'static str {
    use crate::entities::JobState;
    match job.state {
        JobState::Pending => "pending",
        JobState::Processing => "processing",
        JobState::Completed => "completed",
        JobState::Partial => "partial",
        JobState::Failed => "failed",
        JobState::Cancelled => "cancelled",
    }
}

/// Contract for the external spreadsheet export client.
#[async_trait]
pub trait ExportClient: Send + Sync {
    /// Export a list of sentences (or coverage rows) and return a URL.
    async fn export_sentences(&self, title: &str, sentences: &[String]) -> Result<String>;
}

/// Contract for bearer-token verification (auth is an external collaborator).
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token and return the owning user id, or an
    /// [`crate::error::Error::Authentication`] error if invalid.
    async fn verify(&self, token: &str) -> Result<crate::value_objects::UserId>;
}

/// Stable fallback result shared by Chunk completion and the local
/// sentence splitter fallback (spec.md §4.3 tier 4): produces a
/// [`ChunkResult`] with a fallback marker attached.
#[must_use]
pub fn result_with_fallback_marker(
    sentences: Vec<String>,
    token_count: u64,
    start_page: u32,
    end_page: u32,
    fallback_marker: Option<&str>,
) -> ChunkResult {
    ChunkResult {
        sentences,
        token_count,
        start_page,
        end_page,
        fallback_marker: fallback_marker.map(ToOwned::to_owned),
    }
}
