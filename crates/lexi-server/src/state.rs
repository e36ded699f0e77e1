use std::sync::Arc;

use lexi_application::use_cases::coverage_service::CoverageService;
use lexi_application::use_cases::job_orchestrator::JobOrchestrator;
use lexi_domain::ports::repositories::{
    ChunkRepository, CoverageRepository, HistoryRepository, JobRepository, WordListRepository,
};
use lexi_domain::ports::services::{ExportClient, PdfPageExtractor, TaskDispatcher, TokenVerifier};
use lexi_infrastructure::config::AppConfig;
use lexi_infrastructure::events::BroadcastProgressBus;

/// Everything an HTTP/WebSocket handler needs. Built once at startup by
/// the `lexi` binary's composition root and shared via `axum::Router::with_state`.
#[derive(Clone)]
pub struct AppState {
    /// Durable Job storage.
    pub job_repo: Arc<dyn JobRepository>,
    /// Durable Chunk storage.
    pub chunk_repo: Arc<dyn ChunkRepository>,
    /// Durable History storage.
    pub history_repo: Arc<dyn HistoryRepository>,
    /// Durable WordList storage.
    pub word_list_repo: Arc<dyn WordListRepository>,
    /// Durable CoverageRun storage.
    pub coverage_repo: Arc<dyn CoverageRepository>,
    /// Job Orchestrator (C4).
    pub orchestrator: Arc<JobOrchestrator>,
    /// Coverage Service (C8 persistence/orchestration half).
    pub coverage_service: Arc<CoverageService>,
    /// Task Dispatcher (C9), used directly by routes that kick off work
    /// the orchestrator/coverage service don't own (e.g. the initial
    /// CoverageRun dispatch).
    pub dispatcher: Arc<dyn TaskDispatcher>,
    /// PDF page extractor, used by the upload handler to plan Chunks.
    pub pdf_extractor: Arc<dyn PdfPageExtractor>,
    /// External spreadsheet export client.
    pub export_client: Arc<dyn ExportClient>,
    /// Bearer-token verifier.
    pub token_verifier: Arc<dyn TokenVerifier>,
    /// Progress Bus, for the WebSocket upgrade handler.
    pub progress_bus: Arc<BroadcastProgressBus>,
    /// Resolved application configuration.
    pub config: Arc<AppConfig>,
}
