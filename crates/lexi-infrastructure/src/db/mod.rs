//! SQLite connection pool and schema migration (C5's storage engine).

use lexi_domain::error::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Open (creating if absent) the SQLite database at `database_url` and run
/// the embedded schema migration. Every durable repository in this crate
/// shares this pool.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options: SqliteConnectOptions = database_url
        .parse()
        .map_err(|e| Error::config(format!("invalid database_url '{database_url}': {e}")))?;
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options.create_if_missing(true))
        .await
        .map_err(|e| Error::database_with_source("failed to open sqlite pool", e))?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Every table stores its entity as a JSON blob in `data`, with a handful
/// of indexed columns duplicated out for the query patterns the
/// repository ports need (owner, job_id, state, updated_at).
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    state TEXT NOT NULL,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_jobs_owner ON jobs(owner);

CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    job_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    state TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_job ON chunks(job_id, chunk_index);
CREATE INDEX IF NOT EXISTS idx_chunks_state ON chunks(state, updated_at);

CREATE TABLE IF NOT EXISTS history (
    id TEXT PRIMARY KEY,
    job_id TEXT NOT NULL UNIQUE,
    owner TEXT NOT NULL,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_history_owner ON history(owner);

CREATE TABLE IF NOT EXISTS word_lists (
    id TEXT PRIMARY KEY,
    owner TEXT,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_word_lists_owner ON word_lists(owner);

CREATE TABLE IF NOT EXISTS coverage_runs (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    data TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS coverage_assignments (
    run_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY (run_id, position)
);
";

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| Error::database_with_source("failed to run schema migration", e))?;
    Ok(())
}
