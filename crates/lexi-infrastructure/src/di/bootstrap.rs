use std::sync::Arc;

use lexi_domain::error::Result;
use lexi_domain::ports::repositories::{
    ChunkRepository, CoverageRepository, HistoryRepository, JobRepository, WordListRepository,
};

use crate::config::AppConfig;
use crate::db;
use crate::events::BroadcastProgressBus;
use crate::repositories::{
    SqliteChunkRepository, SqliteCoverageRepository, SqliteHistoryRepository, SqliteJobRepository,
    SqliteWordListRepository,
};

/// Infrastructure-layer composition root: config plus every durable
/// repository and the Progress Bus, all wired from a single SQLite pool.
///
/// This is deliberately the *infrastructure* half of the composition
/// root only. The Task Dispatcher needs an [`lexi_domain::ports::services::TaskExecutor`]
/// built from `lexi-application` use-cases, and those use-cases need
/// `lexi-providers` adapters (LLM client, PDF extractor); wiring those on
/// top of this `AppContext` is the `lexi` binary's job (spec.md's ports
/// live in `lexi-domain`, so neither this crate nor `lexi-application`
/// needs to depend on `lexi-providers` to compile).
pub struct AppContext {
    /// Fully validated application configuration.
    pub config: Arc<AppConfig>,
    /// Durable Job storage.
    pub job_repo: Arc<dyn JobRepository>,
    /// Durable Chunk storage with row-locked transitions.
    pub chunk_repo: Arc<dyn ChunkRepository>,
    /// Durable History snapshot storage.
    pub history_repo: Arc<dyn HistoryRepository>,
    /// Durable WordList storage.
    pub word_list_repo: Arc<dyn WordListRepository>,
    /// Durable CoverageRun/assignment storage.
    pub coverage_repo: Arc<dyn CoverageRepository>,
    /// Progress Bus, kept as the concrete type so the server's WebSocket
    /// handler can call `subscribe` directly in addition to the
    /// `ProgressPublisher` trait object used by the orchestrator.
    pub progress_bus: Arc<BroadcastProgressBus>,
}

impl AppContext {
    /// Load config, open the SQLite pool, run migrations, and wire every
    /// durable repository plus the Progress Bus.
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        Ok(Self {
            config: Arc::new(config),
            job_repo: Arc::new(SqliteJobRepository::new(pool.clone())),
            chunk_repo: Arc::new(SqliteChunkRepository::new(pool.clone())),
            history_repo: Arc::new(SqliteHistoryRepository::new(pool.clone())),
            word_list_repo: Arc::new(SqliteWordListRepository::new(pool.clone())),
            coverage_repo: Arc::new(SqliteCoverageRepository::new(pool)),
            progress_bus: Arc::new(BroadcastProgressBus::new()),
        })
    }
}
