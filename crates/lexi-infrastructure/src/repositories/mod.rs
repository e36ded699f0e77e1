//! SQLite-backed implementations of the domain repository ports (C5 and
//! the durable side of C7/C8).

mod sqlite_chunk_repository;
mod sqlite_coverage_repository;
mod sqlite_history_repository;
mod sqlite_job_repository;
mod sqlite_word_list_repository;

pub use sqlite_chunk_repository::SqliteChunkRepository;
pub use sqlite_coverage_repository::SqliteCoverageRepository;
pub use sqlite_history_repository::SqliteHistoryRepository;
pub use sqlite_job_repository::SqliteJobRepository;
pub use sqlite_word_list_repository::SqliteWordListRepository;

fn row_to_json_error(action: &str, err: sqlx::Error) -> lexi_domain::error::Error {
    lexi_domain::error::Error::database_with_source(format!("{action} failed"), err)
}
