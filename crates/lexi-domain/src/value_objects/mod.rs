//! Value objects shared across entities: identifiers and settings.

mod ids;
mod settings;

pub use ids::{ChunkId, CoverageRunId, HistoryId, JobId, UserId, WordListId};
pub use settings::{ModelTier, ProcessingSettings};
