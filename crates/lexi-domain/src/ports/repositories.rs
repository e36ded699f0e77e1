//! Repository ports: persistence-facing seams implemented by
//! infrastructure adapters (spec.md §3 "All persistent entities live in a
//! relational database").

use async_trait::async_trait;

use crate::entities::{Chunk, CoverageAssignment, CoverageRun, History, Job, WordList};
use crate::error::Result;
use crate::value_objects::{ChunkId, CoverageRunId, HistoryId, JobId, UserId, WordListId};

/// Persistence for Jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Persist a new Job.
    async fn insert(&self, job: &Job) -> Result<()>;
    /// Fetch a Job by id.
    async fn get(&self, id: JobId) -> Result<Job>;
    /// Overwrite a Job's full row.
    async fn update(&self, job: &Job) -> Result<()>;
    /// List Jobs owned by `owner`, most recent first.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Job>>;
}

/// Persistence for Chunks, with per-row locking to serialize concurrent
/// worker writes (spec.md §4.5).
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Persist a batch of Chunks for a Job in a single transaction (C2).
    async fn insert_batch(&self, chunks: &[Chunk]) -> Result<()>;
    /// Fetch one Chunk by id.
    async fn get(&self, id: ChunkId) -> Result<Chunk>;
    /// Fetch all Chunks of a Job, ordered by `chunk_index`.
    async fn list_by_job(&self, job_id: JobId) -> Result<Vec<Chunk>>;
    /// Apply a transition function to a Chunk under a row lock, returning the
    /// updated Chunk. The closure receives the current Chunk and must
    /// mutate it in place; the repository persists the result atomically.
    async fn with_lock(
        &self,
        id: ChunkId,
        mutate: Box<dyn FnOnce(&mut Chunk) -> Result<()> + Send>,
    ) -> Result<Chunk>;
    /// Chunks in `processing` state with `updated_at` older than `max_age`,
    /// for the stuck-processing watchdog sweep (spec.md §4.5).
    async fn list_stuck_processing(&self, max_age: chrono::Duration) -> Result<Vec<Chunk>>;
}

/// Persistence for History snapshots.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Persist a new History snapshot.
    async fn insert(&self, history: &History) -> Result<()>;
    /// Fetch a History entry by id.
    async fn get(&self, id: HistoryId) -> Result<History>;
    /// Fetch the History entry for a Job, if one exists.
    async fn get_by_job(&self, job_id: JobId) -> Result<Option<History>>;
    /// Overwrite a History entry's full row (used by `refresh` and export).
    async fn update(&self, history: &History) -> Result<()>;
    /// List History entries owned by `owner`, most recent first.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<History>>;
}

/// Persistence for WordLists.
#[async_trait]
pub trait WordListRepository: Send + Sync {
    /// Persist a new WordList.
    async fn insert(&self, word_list: &WordList) -> Result<()>;
    /// Fetch a WordList by id.
    async fn get(&self, id: WordListId) -> Result<WordList>;
    /// Overwrite a WordList's full row (rename / refresh).
    async fn update(&self, word_list: &WordList) -> Result<()>;
    /// Delete a WordList.
    async fn delete(&self, id: WordListId) -> Result<()>;
    /// List WordLists visible to `owner` (their own plus global lists).
    async fn list_visible_to(&self, owner: UserId) -> Result<Vec<WordList>>;
}

/// Persistence for CoverageRuns and their assignments.
#[async_trait]
pub trait CoverageRepository: Send + Sync {
    /// Persist a new CoverageRun.
    async fn insert_run(&self, run: &CoverageRun) -> Result<()>;
    /// Fetch a CoverageRun by id.
    async fn get_run(&self, id: CoverageRunId) -> Result<CoverageRun>;
    /// Overwrite a CoverageRun's full row.
    async fn update_run(&self, run: &CoverageRun) -> Result<()>;
    /// Replace all assignments for a run (coverage runs are rebuilt whole,
    /// not incrementally patched, except for `swap`).
    async fn replace_assignments(
        &self,
        run_id: CoverageRunId,
        assignments: &[CoverageAssignment],
    ) -> Result<()>;
    /// Fetch a page of assignments for a run.
    async fn list_assignments(
        &self,
        run_id: CoverageRunId,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<CoverageAssignment>>;
}
