//! `/process-pdf-async`, `/jobs/{id}` and friends (spec.md §6).

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use lexi_application::use_cases::pdf_chunker::chunk_pdf;
use lexi_domain::entities::{ChunkState, Job, JobState};
use lexi_domain::error::Error;
use lexi_domain::value_objects::{ChunkId, JobId, ProcessingSettings};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

fn require_owner(job: &Job, user: &lexi_domain::value_objects::UserId) -> Result<(), ApiError> {
    if job.owner != *user {
        return Err(Error::ownership(format!("job {} is not owned by the caller", job.id)).into());
    }
    Ok(())
}

#[derive(Serialize)]
struct StartJobResponse {
    job_id: JobId,
    task_id: String,
    status: &'static str,
}

/// `POST /process-pdf-async`: plans Chunks for `pdf_file` and starts the Job.
///
/// If the multipart `job_id` field names an existing pending Job owned by
/// the caller, that Job is started. Otherwise a new Job is created from
/// the `settings` field (default settings if absent).
pub async fn start_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StartJobResponse>), ApiError> {
    let mut pdf_bytes: Option<Vec<u8>> = None;
    let mut filename = "document.pdf".to_owned();
    let mut job_id: Option<JobId> = None;
    let mut settings = ProcessingSettings::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_argument(format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "pdf_file" => {
                filename = field.file_name().unwrap_or("document.pdf").to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::invalid_argument(format!("could not read pdf_file: {e}")))?;
                pdf_bytes = Some(bytes.to_vec());
            }
            "job_id" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    job_id = Some(
                        JobId::from_str(&text)
                            .map_err(|_| Error::invalid_argument("job_id is not a valid identifier"))?,
                    );
                }
            }
            "settings" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    settings = serde_json::from_str(&text)?;
                }
            }
            _ => {}
        }
    }

    let pdf_bytes = pdf_bytes.ok_or_else(|| Error::invalid_argument("missing pdf_file part"))?;
    if pdf_bytes.is_empty() {
        return Err(Error::pdf("uploaded pdf_file is empty").into());
    }

    let job = match job_id {
        Some(id) => {
            let existing = state.job_repo.get(id).await?;
            require_owner(&existing, &user)?;
            if existing.state != JobState::Pending {
                return Err(Error::invalid_transition(format!("job {id} already started")).into());
            }
            existing
        }
        None => {
            let job = Job::new(user, filename, settings);
            state.job_repo.insert(&job).await?;
            job
        }
    };

    let plan = chunk_pdf(job.id, &pdf_bytes, &state.pdf_extractor, &state.chunk_repo).await?;
    if plan.degraded_mode {
        state.chunk_repo.insert_batch(&plan.chunks).await?;
    }

    let group_id = state.orchestrator.start(job.id).await?;
    tracing::info!(job_id = %job.id, chunks = plan.chunks.len(), "job started");

    Ok((
        StatusCode::ACCEPTED,
        Json(StartJobResponse {
            job_id: job.id,
            task_id: group_id,
            status: "pending",
        }),
    ))
}

/// `GET /jobs/{id}`: poll Job state.
pub async fn get_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<JobId>,
) -> Result<Json<Job>, ApiError> {
    let job = state.job_repo.get(id).await?;
    require_owner(&job, &user)?;
    Ok(Json(job))
}

#[derive(Serialize)]
struct CancelResponse {
    status: &'static str,
}

/// `POST /jobs/{id}/cancel`.
pub async fn cancel_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<JobId>,
) -> Result<Json<CancelResponse>, ApiError> {
    let job = state.job_repo.get(id).await?;
    require_owner(&job, &user)?;
    state.orchestrator.cancel(id).await?;
    tracing::info!(job_id = %id, "job cancelled");
    Ok(Json(CancelResponse { status: "cancelled" }))
}

#[derive(Serialize)]
struct ChunksResponse {
    chunks: Vec<lexi_domain::entities::Chunk>,
    summary: HashMap<String, u32>,
}

/// `GET /jobs/{id}/chunks`: chunk-level detail plus summary counts.
pub async fn list_chunks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<JobId>,
) -> Result<Json<ChunksResponse>, ApiError> {
    let job = state.job_repo.get(id).await?;
    require_owner(&job, &user)?;
    let chunks = state.chunk_repo.list_by_job(id).await?;

    let mut summary = HashMap::new();
    for chunk in &chunks {
        let label = chunk_state_label(chunk.state);
        *summary.entry(label.to_owned()).or_insert(0) += 1;
    }

    Ok(Json(ChunksResponse { chunks, summary }))
}

fn chunk_state_label(state: ChunkState) -> &'static str {
    match state {
        ChunkState::Pending => "pending",
        ChunkState::Processing => "processing",
        ChunkState::Success => "success",
        ChunkState::Failed => "failed",
        ChunkState::RetryScheduled => "retry_scheduled",
    }
}

#[derive(Deserialize, Default)]
pub struct RetryChunksRequest {
    chunk_indices: Option<Vec<u32>>,
    force: Option<bool>,
}

#[derive(Serialize)]
struct RetryChunksResponse {
    retried_count: u32,
    group_id: String,
}

/// `POST /jobs/{id}/chunks/retry`: manual retry of failed Chunks.
pub async fn retry_chunks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<JobId>,
    Json(body): Json<RetryChunksRequest>,
) -> Result<Json<RetryChunksResponse>, ApiError> {
    let mut job = state.job_repo.get(id).await?;
    require_owner(&job, &user)?;
    if job.state == JobState::Cancelled {
        return Err(Error::invalid_transition("cancelled jobs cannot be retried").into());
    }

    let force = body.force.unwrap_or(false);
    let all_chunks = state.chunk_repo.list_by_job(id).await?;
    let targets: Vec<ChunkId> = all_chunks
        .iter()
        .filter(|c| match &body.chunk_indices {
            Some(indices) => indices.contains(&c.chunk_index),
            None => c.state == ChunkState::Failed,
        })
        .map(|c| c.id)
        .collect();

    let mut retried: Vec<ChunkId> = Vec::new();
    for chunk_id in targets {
        let result = state
            .chunk_repo
            .with_lock(
                chunk_id,
                Box::new(move |c| c.schedule_retry_forced(force)),
            )
            .await;
        if result.is_ok() {
            retried.push(chunk_id);
        }
    }

    if retried.is_empty() {
        return Err(Error::invalid_argument("no eligible chunks to retry").into());
    }

    job.reopen_for_retry()?;
    state.job_repo.update(&job).await?;

    let tasks = retried
        .into_iter()
        .map(|chunk_id| lexi_domain::ports::services::TaskPayload::ChunkProcess { chunk_id, job_id: id })
        .collect::<Vec<_>>();
    let retried_count = tasks.len() as u32;
    let group_id = state
        .dispatcher
        .dispatch_group_with_callback(
            tasks,
            lexi_domain::ports::services::TaskPayload::JobFinalize { job_id: id },
        )
        .await?;

    Ok(Json(RetryChunksResponse { retried_count, group_id }))
}
