//! History entity — durable snapshot of a terminal Job's outputs (spec.md §3, §4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ChunkId, HistoryId, JobId, ProcessingSettings, UserId};

/// One sentence captured by a History snapshot, before and after normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySentence {
    /// Canonical (normalized) form.
    pub normalized: String,
    /// Original surface form as emitted by the LLM or local fallback.
    pub original: String,
}

/// Where the sentences returned by a read came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentencesSource {
    /// Rebuilt live from current Chunk rows.
    LiveChunks,
    /// Served from the stored snapshot.
    Snapshot,
}

/// A durable, user-visible record of a terminal Job's outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    /// Unique identifier.
    pub id: HistoryId,
    /// Owning user.
    pub owner: UserId,
    /// The Job this snapshot was produced from.
    pub job_id: JobId,
    /// Original uploaded filename, copied from the Job.
    pub original_filename: String,
    /// When the snapshot was created.
    pub created_at: DateTime<Utc>,
    /// Ordered sentence snapshot.
    pub sentences: Vec<HistorySentence>,
    /// Number of sentences in the snapshot.
    pub processed_sentence_count: u32,
    /// Ids of the Chunks used to build this snapshot, for drill-down.
    pub chunk_ids: Vec<ChunkId>,
    /// Processing settings in effect when the Job ran.
    pub settings_snapshot: ProcessingSettings,
    /// Whether an export has been produced for this History entry.
    pub export_status: bool,
    /// URL of the last export, if any.
    pub export_url: Option<String>,
    /// Error summary, copied from the Job for partial/failed outcomes.
    pub error_summary: Option<String>,
}

impl History {
    /// Build a new History snapshot from merged sentences (called by the
    /// `snapshot` operation of the History Snapshot component, C7).
    #[must_use]
    pub fn new_snapshot(
        owner: UserId,
        job_id: JobId,
        original_filename: impl Into<String>,
        sentences: Vec<HistorySentence>,
        chunk_ids: Vec<ChunkId>,
        settings_snapshot: ProcessingSettings,
        error_summary: Option<String>,
    ) -> Self {
        let processed_sentence_count = sentences.len() as u32;
        Self {
            id: HistoryId::new(),
            owner,
            job_id,
            original_filename: original_filename.into(),
            created_at: Utc::now(),
            sentences,
            processed_sentence_count,
            chunk_ids,
            settings_snapshot,
            export_status: false,
            export_url: None,
            error_summary,
        }
    }

    /// Overwrite the stored snapshot with freshly rebuilt sentences
    /// (`refresh`, spec.md §4.7). Returns the new sentence count.
    pub fn apply_refresh(&mut self, sentences: Vec<HistorySentence>) -> u32 {
        self.processed_sentence_count = sentences.len() as u32;
        self.sentences = sentences;
        self.processed_sentence_count
    }

    /// Record a completed export.
    pub fn mark_exported(&mut self, url: impl Into<String>) {
        self.export_status = true;
        self.export_url = Some(url.into());
    }
}
