//! Core data model entities (spec.md §3).

mod chunk;
mod coverage;
mod history;
mod job;
mod word_list;

pub use chunk::{Chunk, ChunkPayload, ChunkResult, ChunkState, DEFAULT_MAX_RETRIES as CHUNK_MAX_RETRIES};
pub use coverage::{
    CoverageAssignment, CoverageConfig, CoverageMode, CoverageModeConfig, CoverageRun,
    CoverageSourceType, CoverageStats, FilterModeConfig,
};
pub use history::{History, HistorySentence, SentencesSource};
pub use job::{Job, JobState, DEFAULT_MAX_RETRIES as JOB_MAX_RETRIES};
pub use word_list::{IngestionAnomaly, IngestionReport, WordList};
