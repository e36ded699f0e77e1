//! Binds the two task kinds the core ever dispatches to their executing
//! use-cases, so the Task Dispatcher (C9) can stay a thin broker adapter
//! that never imports application use-cases directly (spec.md §4.9).

use std::sync::Arc;

use async_trait::async_trait;
use lexi_domain::ports::services::{TaskExecutor, TaskOutcome, TaskPayload};

use crate::use_cases::coverage_service::CoverageService;
use crate::use_cases::job_orchestrator::JobOrchestrator;

/// Routes a [`TaskPayload`] to the Job Orchestrator or the Coverage
/// Service, whichever owns that task kind.
pub struct CompositeExecutor {
    orchestrator: Arc<JobOrchestrator>,
    coverage_service: Arc<CoverageService>,
}

impl CompositeExecutor {
    /// Build a new executor from its collaborators.
    #[must_use]
    pub fn new(orchestrator: Arc<JobOrchestrator>, coverage_service: Arc<CoverageService>) -> Self {
        Self {
            orchestrator,
            coverage_service,
        }
    }
}

#[async_trait]
impl TaskExecutor for CompositeExecutor {
    async fn execute(&self, payload: &TaskPayload) -> TaskOutcome {
        let task_id = task_id_for(payload);
        let result = match payload {
            TaskPayload::ChunkProcess { chunk_id, job_id } => {
                self.orchestrator.process_chunk(*chunk_id, *job_id).await
            }
            TaskPayload::JobFinalize { job_id } => self.orchestrator.finalize(*job_id).await,
            TaskPayload::CoverageBuild { run_id } => self.coverage_service.run(*run_id).await,
        };

        match result {
            Ok(()) => TaskOutcome {
                task_id,
                payload: payload.clone(),
                success: true,
                error: None,
            },
            Err(err) => TaskOutcome {
                task_id,
                payload: payload.clone(),
                success: false,
                error: Some(err.to_string()),
            },
        }
    }
}

fn task_id_for(payload: &TaskPayload) -> String {
    match payload {
        TaskPayload::ChunkProcess { chunk_id, .. } => format!("chunk-process-{chunk_id}"),
        TaskPayload::JobFinalize { job_id } => format!("job-finalize-{job_id}"),
        TaskPayload::CoverageBuild { run_id } => format!("coverage-build-{run_id}"),
    }
}
