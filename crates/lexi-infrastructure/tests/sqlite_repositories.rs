//! Integration tests for the SQLite-backed repository adapters, run
//! against a throwaway on-disk database per test (spec.md §3 entities).

use lexi_domain::entities::{ChunkPayload, ChunkResult, Job, JobState};
use lexi_domain::ports::repositories::{ChunkRepository, JobRepository};
use lexi_domain::value_objects::{ProcessingSettings, UserId};
use lexi_infrastructure::repositories::{SqliteChunkRepository, SqliteJobRepository};

async fn test_pool() -> sqlx::SqlitePool {
    let url = format!("sqlite://{}", tempfile::NamedTempFile::new().unwrap().path().display());
    lexi_infrastructure::db::connect(&url).await.unwrap()
}

#[tokio::test]
async fn job_round_trips_through_sqlite() {
    let pool = test_pool().await;
    let repo = SqliteJobRepository::new(pool);

    let owner = UserId::new();
    let job = Job::new(owner, "book.pdf", ProcessingSettings::default());
    repo.insert(&job).await.unwrap();

    let fetched = repo.get(job.id).await.unwrap();
    assert_eq!(fetched.id, job.id);
    assert_eq!(fetched.state, JobState::Pending);

    let mut updated = fetched;
    updated.begin_processing(2, None).unwrap();
    repo.update(&updated).await.unwrap();

    let reloaded = repo.get(job.id).await.unwrap();
    assert_eq!(reloaded.state, JobState::Processing);

    let owned = repo.list_by_owner(owner).await.unwrap();
    assert_eq!(owned.len(), 1);
}

#[tokio::test]
async fn chunk_with_lock_serializes_a_transition() {
    let pool = test_pool().await;
    let repo = SqliteChunkRepository::new(pool);

    let job_id = lexi_domain::value_objects::JobId::new();
    let chunk = lexi_domain::entities::Chunk::new_pending(
        job_id,
        0,
        1,
        20,
        false,
        ChunkPayload::Inline("YWJj".to_owned()),
        128,
    );
    repo.insert_batch(&[chunk.clone()]).await.unwrap();

    let claimed = repo
        .with_lock(
            chunk.id,
            Box::new(|c| c.claim("task-1")),
        )
        .await
        .unwrap();
    assert_eq!(claimed.attempts, 1);

    let completed = repo
        .with_lock(
            chunk.id,
            Box::new(|c| {
                c.complete(ChunkResult {
                    sentences: vec!["Il fait beau.".to_owned()],
                    token_count: 10,
                    start_page: 1,
                    end_page: 20,
                    fallback_marker: None,
                })
            }),
        )
        .await
        .unwrap();
    assert!(completed.state.is_success());

    let stuck = repo.list_stuck_processing(chrono::Duration::seconds(0)).await.unwrap();
    assert!(stuck.is_empty());
}
