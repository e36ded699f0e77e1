//! `/wordlists[/{id}]` CRUD and `/refresh` (spec.md §6, §4.1).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use lexi_application::use_cases::word_list_ingestion::ingest_word_list;
use lexi_domain::entities::WordList;
use lexi_domain::error::Error;
use lexi_domain::normalizer::MatchingMode;
use lexi_domain::value_objects::{UserId, WordListId};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

fn require_owner(word_list: &WordList, user: &UserId) -> Result<(), ApiError> {
    match word_list.owner {
        Some(owner) if owner == *user => Ok(()),
        _ => Err(Error::ownership(format!("word list {} is not owned by the caller", word_list.id)).into()),
    }
}

/// `GET /wordlists`: lists owned by the caller plus global lists.
pub async fn list_word_lists(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<WordList>>, ApiError> {
    Ok(Json(state.word_list_repo.list_visible_to(user).await?))
}

/// `GET /wordlists/{id}`.
pub async fn get_word_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<WordListId>,
) -> Result<Json<WordList>, ApiError> {
    let word_list = state.word_list_repo.get(id).await?;
    if word_list.owner.is_some_and(|o| o != user) {
        return Err(Error::ownership(format!("word list {id} is not owned by the caller")).into());
    }
    Ok(Json(word_list))
}

#[derive(Deserialize)]
pub struct CreateWordListRequest {
    name: String,
    raw_entries: Vec<String>,
    #[serde(default)]
    matching_mode: MatchingMode,
    #[serde(default = "default_fold_diacritics")]
    fold_diacritics: bool,
    #[serde(default)]
    global: bool,
}

fn default_fold_diacritics() -> bool {
    true
}

/// `POST /wordlists`: ingest raw entries into a new WordList.
pub async fn create_word_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateWordListRequest>,
) -> Result<(StatusCode, Json<WordList>), ApiError> {
    let (word_keys, report) = ingest_word_list(&body.raw_entries, body.matching_mode, body.fold_diacritics);
    let owner = if body.global { None } else { Some(user) };
    let word_list = WordList::new(owner, body.name, word_keys, body.matching_mode, report);
    state.word_list_repo.insert(&word_list).await?;
    Ok((StatusCode::CREATED, Json(word_list)))
}

#[derive(Deserialize)]
pub struct RenameWordListRequest {
    name: String,
}

/// `PATCH /wordlists/{id}`: rename.
pub async fn rename_word_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<WordListId>,
    Json(body): Json<RenameWordListRequest>,
) -> Result<Json<WordList>, ApiError> {
    let mut word_list = state.word_list_repo.get(id).await?;
    require_owner(&word_list, &user)?;
    word_list.rename(body.name);
    state.word_list_repo.update(&word_list).await?;
    Ok(Json(word_list))
}

/// `DELETE /wordlists/{id}`.
pub async fn delete_word_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<WordListId>,
) -> Result<StatusCode, ApiError> {
    let word_list = state.word_list_repo.get(id).await?;
    require_owner(&word_list, &user)?;
    state.word_list_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct RefreshWordListRequest {
    raw_entries: Vec<String>,
    #[serde(default = "default_fold_diacritics")]
    fold_diacritics: bool,
}

/// `POST /wordlists/{id}/refresh`: re-ingest from a fresh raw entry list.
pub async fn refresh_word_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<WordListId>,
    Json(body): Json<RefreshWordListRequest>,
) -> Result<Json<WordList>, ApiError> {
    let mut word_list = state.word_list_repo.get(id).await?;
    require_owner(&word_list, &user)?;
    let (word_keys, report) = ingest_word_list(&body.raw_entries, word_list.matching_mode, body.fold_diacritics);
    word_list.apply_refresh(word_keys, report);
    state.word_list_repo.update(&word_list).await?;
    Ok(Json(word_list))
}
