//! `lexi`: composition root. Loads configuration, wires every concrete
//! adapter behind the domain's ports, and serves the HTTP/WebSocket API
//! (spec.md §6).

use std::sync::Arc;

use clap::Parser;
use lexi_application::task_executor::CompositeExecutor;
use lexi_application::use_cases::coverage_service::CoverageService;
use lexi_application::use_cases::job_orchestrator::{JobOrchestrator, OrchestratorConfig};
use lexi_domain::ports::services::{ExportClient, LlmClient, PdfPageExtractor, TaskDispatcher, TokenVerifier};
use lexi_infrastructure::config;
use lexi_infrastructure::di::AppContext;
use lexi_infrastructure::dispatcher::InProcessDispatcher;
use lexi_infrastructure::logging;
use lexi_providers::auth::SharedSecretTokenVerifier;
use lexi_providers::export::HttpExportClient;
use lexi_providers::llm::{HttpLlmClient, HttpLlmConfig};
use lexi_providers::pdf::PdfExtractExtractor;

/// Asynchronous chunked PDF-to-French-sentence job orchestration service.
#[derive(Parser, Debug)]
#[command(name = "lexi", version, about)]
struct Cli {
    /// Path to a `lexi.toml` configuration file. Falls back to
    /// `LEXI_CONFIG`, an ancestor `lexi.toml`, then built-in defaults.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    logging::init_logging(&config)?;

    let bind_addr = config.bind_addr.clone();
    tracing::info!(%bind_addr, "starting lexi");

    let context = AppContext::bootstrap(config).await?;

    let pdf_extractor: Arc<dyn PdfPageExtractor> = Arc::new(PdfExtractExtractor::new());
    let llm: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(HttpLlmConfig {
        base_url: context.config.llm.base_url.clone(),
        api_key: context.config.llm.api_key.clone(),
        speed_model: context.config.llm.speed_model.clone(),
        balanced_model: context.config.llm.balanced_model.clone(),
        quality_model: context.config.llm.quality_model.clone(),
    }));
    let export_client: Arc<dyn ExportClient> = Arc::new(HttpExportClient::new(context.config.export_endpoint.clone()));
    let token_verifier: Arc<dyn TokenVerifier> =
        Arc::new(SharedSecretTokenVerifier::new(context.config.auth.bearer_secret.clone()));

    // The dispatcher and the orchestrator refer to each other (the
    // orchestrator dispatches chunk tasks; the executor those tasks run
    // through routes back into the orchestrator), so the dispatcher's
    // executor is bound after both are built.
    let dispatcher = Arc::new(InProcessDispatcher::new());
    let dispatcher_port: Arc<dyn TaskDispatcher> = dispatcher.clone();

    let orchestrator = Arc::new(JobOrchestrator::new(
        context.job_repo.clone(),
        context.chunk_repo.clone(),
        context.history_repo.clone(),
        dispatcher_port.clone(),
        context.progress_bus.clone(),
        pdf_extractor.clone(),
        llm,
        OrchestratorConfig {
            allow_local_fallback: context.config.allow_local_fallback,
        },
    ));
    let coverage_service = Arc::new(CoverageService::new(
        context.coverage_repo.clone(),
        context.word_list_repo.clone(),
        context.job_repo.clone(),
        context.chunk_repo.clone(),
        context.history_repo.clone(),
    ));

    let executor = Arc::new(CompositeExecutor::new(orchestrator.clone(), coverage_service.clone()));
    dispatcher.set_executor(executor);

    let state = lexi_server::state::AppState {
        job_repo: context.job_repo,
        chunk_repo: context.chunk_repo,
        history_repo: context.history_repo,
        word_list_repo: context.word_list_repo,
        coverage_repo: context.coverage_repo,
        orchestrator,
        coverage_service,
        dispatcher: dispatcher_port,
        pdf_extractor,
        export_client,
        token_verifier,
        progress_bus: context.progress_bus,
        config: context.config,
    };

    let app = lexi_server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
