//! `/history/{id}` and friends (spec.md §6, §4.7).

use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::Query;
use lexi_application::history_service::{read_history, refresh_history};
use lexi_domain::entities::{History, SentencesSource};
use lexi_domain::error::Error;
use lexi_domain::value_objects::HistoryId;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

fn require_owner(history: &History, user: &lexi_domain::value_objects::UserId) -> Result<(), ApiError> {
    if history.owner != *user {
        return Err(Error::ownership(format!("history {} is not owned by the caller", history.id)).into());
    }
    Ok(())
}

fn source_label(source: SentencesSource) -> &'static str {
    match source {
        SentencesSource::LiveChunks => "live_chunks",
        SentencesSource::Snapshot => "snapshot",
    }
}

#[derive(Deserialize)]
pub struct ReadQuery {
    #[serde(default = "default_use_live")]
    use_live: bool,
}

fn default_use_live() -> bool {
    true
}

#[derive(Serialize)]
struct ReadResponse {
    #[serde(flatten)]
    entry: History,
    sentences_source: &'static str,
}

/// `GET /history/{id}?use_live`.
pub async fn get_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<HistoryId>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<ReadResponse>, ApiError> {
    let entry = state.history_repo.get(id).await?;
    require_owner(&entry, &user)?;

    let read = read_history(id, query.use_live, &state.history_repo, &state.chunk_repo).await?;
    let mut entry = entry;
    entry.sentences = read.sentences;
    entry.processed_sentence_count = entry.sentences.len() as u32;

    Ok(Json(ReadResponse {
        entry,
        sentences_source: source_label(read.source),
    }))
}

#[derive(Serialize)]
struct RefreshResponse {
    sentences_count: u32,
    entry: History,
}

/// `POST /history/{id}/refresh`: rebuild the stored snapshot from Chunks.
pub async fn refresh(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<HistoryId>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let existing = state.history_repo.get(id).await?;
    require_owner(&existing, &user)?;

    let sentences_count = refresh_history(id, &state.history_repo, &state.chunk_repo).await?;
    let entry = state.history_repo.get(id).await?;
    Ok(Json(RefreshResponse { sentences_count, entry }))
}

#[derive(Serialize)]
struct ExportResponse {
    url: String,
    sentences_source: &'static str,
    sentences_count: u32,
}

/// `POST /history/{id}/export`: export via the external spreadsheet client.
pub async fn export(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<HistoryId>,
) -> Result<Json<ExportResponse>, ApiError> {
    let mut entry = state.history_repo.get(id).await?;
    require_owner(&entry, &user)?;

    let read = read_history(id, true, &state.history_repo, &state.chunk_repo).await?;
    let sentences: Vec<String> = read.sentences.iter().map(|s| s.normalized.clone()).collect();
    let url = state
        .export_client
        .export_sentences(&entry.original_filename, &sentences)
        .await?;

    entry.mark_exported(url.clone());
    state.history_repo.update(&entry).await?;

    Ok(Json(ExportResponse {
        url,
        sentences_source: source_label(read.source),
        sentences_count: sentences.len() as u32,
    }))
}
