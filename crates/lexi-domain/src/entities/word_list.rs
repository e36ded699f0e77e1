//! WordList entity — an ordered, uniqued target vocabulary (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{UserId, WordListId};

/// A single anomaly encountered while ingesting a WordList source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionAnomaly {
    /// The original raw entry that produced the anomaly.
    pub raw_entry: String,
    /// Human-readable description of what was unusual about it.
    pub description: String,
}

/// Report produced while normalizing a WordList's raw source entries
/// (spec.md §4.1, recorded alongside the normalizer's output).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Number of raw entries in the source.
    pub original_count: u32,
    /// Number of entries dropped as exact duplicates after normalization.
    pub dedup_count: u32,
    /// Raw entries that expanded into multiple variants (e.g. `a|b`).
    pub detected_variants: Vec<String>,
    /// Entries where a multi-token head extraction occurred.
    pub multi_token_head_extractions: Vec<String>,
    /// Entries that could not be cleanly normalized.
    pub anomalies: Vec<IngestionAnomaly>,
}

/// Ordered, uniqued set of canonical word keys, plus how it was built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordList {
    /// Unique identifier.
    pub id: WordListId,
    /// Owning user, or `None` for a global word list.
    pub owner: Option<UserId>,
    /// Display name.
    pub name: String,
    /// Canonical, deduplicated word keys, in first-seen order.
    pub word_keys: Vec<String>,
    /// Matching mode these keys were normalized under.
    pub matching_mode: crate::normalizer::MatchingMode,
    /// Report produced the last time this list was (re)ingested.
    pub ingestion_report: IngestionReport,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time the list was renamed or refreshed from source.
    pub updated_at: DateTime<Utc>,
}

impl WordList {
    /// Build a new WordList from already-normalized, deduplicated keys.
    #[must_use]
    pub fn new(
        owner: Option<UserId>,
        name: impl Into<String>,
        word_keys: Vec<String>,
        matching_mode: crate::normalizer::MatchingMode,
        ingestion_report: IngestionReport,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WordListId::new(),
            owner,
            name: name.into(),
            word_keys,
            matching_mode,
            ingestion_report,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rename the list. The only mutation allowed besides a full refresh.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Replace the word keys and ingestion report after a manual refresh
    /// from source.
    pub fn apply_refresh(&mut self, word_keys: Vec<String>, ingestion_report: IngestionReport) {
        self.word_keys = word_keys;
        self.ingestion_report = ingestion_report;
        self.updated_at = Utc::now();
    }
}
