//! `/coverage/run` and `/coverage/runs/{id}` (spec.md §6, §4.8).

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::Query;
use lexi_domain::entities::{
    CoverageAssignment, CoverageConfig, CoverageMode, CoverageModeConfig, CoverageRun, CoverageSourceType,
    FilterModeConfig,
};
use lexi_domain::error::Error;
use lexi_domain::ports::services::TaskPayload;
use lexi_domain::value_objects::{CoverageRunId, UserId, WordListId};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

fn require_owner(run: &CoverageRun, user: &UserId) -> Result<(), ApiError> {
    if run.owner != *user {
        return Err(Error::ownership(format!("coverage run {} is not owned by the caller", run.id)).into());
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct StartRunRequest {
    mode: CoverageMode,
    source_type: CoverageSourceType,
    source_id: uuid::Uuid,
    wordlist_id: Option<WordListId>,
    config: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct StartRunResponse {
    coverage_run: CoverageRun,
    task_id: String,
}

/// `POST /coverage/run`.
pub async fn start_run(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<StartRunRequest>,
) -> Result<(StatusCode, Json<StartRunResponse>), ApiError> {
    let wordlist_id = body
        .wordlist_id
        .ok_or_else(|| Error::invalid_argument("wordlist_id is required"))?;
    state.word_list_repo.get(wordlist_id).await?;

    let config = match body.mode {
        CoverageMode::Coverage => {
            let cfg = match body.config {
                Some(value) => serde_json::from_value(value)?,
                None => CoverageModeConfig::default(),
            };
            CoverageConfig::Coverage(cfg)
        }
        CoverageMode::Filter => {
            let cfg = match body.config {
                Some(value) => serde_json::from_value(value)?,
                None => FilterModeConfig::default(),
            };
            CoverageConfig::Filter(cfg)
        }
    };

    let run = CoverageRun::new(user, body.mode, body.source_type, body.source_id, wordlist_id, config);
    state.coverage_repo.insert_run(&run).await?;

    let task_id = state
        .dispatcher
        .dispatch_single(TaskPayload::CoverageBuild { run_id: run.id })
        .await?;

    Ok((StatusCode::ACCEPTED, Json(StartRunResponse { coverage_run: run, task_id })))
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    offset: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    100
}

#[derive(Serialize)]
struct RunStatusResponse {
    #[serde(flatten)]
    run: CoverageRun,
    assignments: Vec<CoverageAssignment>,
}

/// `GET /coverage/runs/{id}`: status plus a page of assignments.
pub async fn get_run(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CoverageRunId>,
    Query(page): Query<PageQuery>,
) -> Result<Json<RunStatusResponse>, ApiError> {
    let run = state.coverage_repo.get_run(id).await?;
    require_owner(&run, &user)?;
    let assignments = state.coverage_repo.list_assignments(id, page.offset, page.limit).await?;
    Ok(Json(RunStatusResponse { run, assignments }))
}

#[derive(Deserialize)]
pub struct SwapRequest {
    word_key: String,
    new_sentence_index: u32,
    new_sentence_text: String,
}

#[derive(Serialize)]
struct SwapResponse {
    status: &'static str,
}

/// `POST /coverage/runs/{id}/swap`: coverage mode only.
pub async fn swap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CoverageRunId>,
    Json(body): Json<SwapRequest>,
) -> Result<Json<SwapResponse>, ApiError> {
    let run = state.coverage_repo.get_run(id).await?;
    require_owner(&run, &user)?;
    state
        .coverage_service
        .swap(id, &body.word_key, body.new_sentence_index, body.new_sentence_text)
        .await?;
    Ok(Json(SwapResponse { status: "swapped" }))
}

#[derive(Serialize)]
struct ExportResponse {
    url: String,
}

/// `POST /coverage/runs/{id}/export`.
pub async fn export(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CoverageRunId>,
) -> Result<Json<ExportResponse>, ApiError> {
    let run = state.coverage_repo.get_run(id).await?;
    require_owner(&run, &user)?;
    let assignments = state.coverage_repo.list_assignments(id, 0, u32::MAX).await?;
    let sentences = assignment_sentences(&assignments);
    let url = state.export_client.export_sentences(&format!("coverage-run-{id}"), &sentences).await?;
    Ok(Json(ExportResponse { url }))
}

/// `GET /coverage/runs/{id}/download`: CSV of selected sentences.
pub async fn download_csv(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CoverageRunId>,
) -> Result<Response, ApiError> {
    let run = state.coverage_repo.get_run(id).await?;
    require_owner(&run, &user)?;
    let assignments = state.coverage_repo.list_assignments(id, 0, u32::MAX).await?;
    let csv = assignments_to_csv(&assignments);

    Ok((
        [(header::CONTENT_TYPE, "text/csv")],
        csv,
    )
        .into_response())
}

fn assignment_sentences(assignments: &[CoverageAssignment]) -> Vec<String> {
    assignments
        .iter()
        .map(|a| match a {
            CoverageAssignment::Coverage { sentence_text, .. } => sentence_text.clone(),
            CoverageAssignment::Filter { sentence_text, .. } => sentence_text.clone(),
        })
        .collect()
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

fn assignments_to_csv(assignments: &[CoverageAssignment]) -> String {
    let mut out = String::from("word_key,sentence_index,sentence_text,score\n");
    for a in assignments {
        match a {
            CoverageAssignment::Coverage {
                word_key,
                sentence_index,
                sentence_text,
                sentence_score,
                ..
            } => {
                out.push_str(&format!(
                    "{},{},{},{}\n",
                    csv_escape(word_key),
                    sentence_index,
                    csv_escape(sentence_text),
                    sentence_score
                ));
            }
            CoverageAssignment::Filter {
                sentence_index,
                sentence_text,
                composite_score,
                ..
            } => {
                out.push_str(&format!(
                    ",{},{},{}\n",
                    sentence_index,
                    csv_escape(sentence_text),
                    composite_score
                ));
            }
        }
    }
    out
}
