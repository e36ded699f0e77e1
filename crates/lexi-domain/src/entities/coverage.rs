//! CoverageRun / CoverageAssignment entities — vocabulary coverage jobs
//! (spec.md §3, §4.8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::JobState;
use crate::value_objects::{CoverageRunId, JobId, UserId, WordListId};

/// Which algorithm a CoverageRun executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    /// Greedy set-cover over word-list keys.
    Coverage,
    /// Multi-pass acceptance filter over short, in-list-heavy sentences.
    Filter,
}

/// What a CoverageRun reads its sentences from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageSourceType {
    /// Live Chunks of an in-flight or completed Job.
    Job,
    /// A History snapshot.
    History,
}

/// Configuration for the set-cover (`coverage`) mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageModeConfig {
    /// Weight of the duplicate-coverage penalty.
    pub alpha: f64,
    /// Weight of the per-sentence quality score.
    pub beta: f64,
    /// Weight of the length penalty.
    pub gamma: f64,
    /// Target sentence length, in words, used by the quality score.
    pub target_length: u32,
    /// Hard cap on the number of sentences the greedy loop may select.
    pub max_sentences: u32,
}

impl Default for CoverageModeConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.3,
            gamma: 0.2,
            target_length: 6,
            max_sentences: 1000,
        }
    }
}

/// Configuration for the acceptance-filter (`filter`) mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterModeConfig {
    /// Minimum fraction of in-list tokens required to accept a sentence.
    pub min_in_list_ratio: f64,
    /// Minimum accepted token count.
    pub len_min: u32,
    /// Maximum accepted token count.
    pub len_max: u32,
    /// Stop once this many sentences are selected.
    pub target_count: u32,
}

impl Default for FilterModeConfig {
    fn default() -> Self {
        Self {
            min_in_list_ratio: 0.95,
            len_min: 4,
            len_max: 8,
            target_count: 500,
        }
    }
}

/// Mode-specific configuration for a CoverageRun.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CoverageConfig {
    /// Configuration for [`CoverageMode::Coverage`].
    Coverage(CoverageModeConfig),
    /// Configuration for [`CoverageMode::Filter`].
    Filter(FilterModeConfig),
}

/// Aggregate statistics produced by either coverage mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageStats {
    /// Total sentences considered.
    pub total_sentences: u32,
    /// Total word-list keys considered.
    pub total_word_keys: u32,
    /// Word-list keys present in at least one selected sentence.
    pub covered_word_keys: u32,
    /// Word-list keys present in no selected sentence.
    pub uncovered_word_keys: Vec<String>,
    /// `selected / considered` acceptance ratio (filter mode).
    pub acceptance_ratio: f64,
    /// Wall-clock runtime of the algorithm, in milliseconds.
    pub runtime_ms: u64,
}

/// A vocabulary-coverage job over a fixed set of sentences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageRun {
    /// Unique identifier.
    pub id: CoverageRunId,
    /// Owning user.
    pub owner: UserId,
    /// Algorithm mode.
    pub mode: CoverageMode,
    /// What the sentences were read from.
    pub source_type: CoverageSourceType,
    /// Id of the Job or History the sentences were read from.
    pub source_id: uuid::Uuid,
    /// The word list being covered or filtered against.
    pub word_list_id: WordListId,
    /// Mode-specific configuration.
    pub config: CoverageConfig,
    /// Lifecycle state, reusing the Job state machine.
    pub state: JobState,
    /// Progress percent in `[0, 100]`.
    pub progress_percent: u8,
    /// Aggregate stats, populated once the run completes.
    pub stats: Option<CoverageStats>,
    /// Id of the dispatched task, if any.
    pub dispatched_task_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
}

impl CoverageRun {
    /// Create a new CoverageRun in `Pending` state.
    #[must_use]
    pub fn new(
        owner: UserId,
        mode: CoverageMode,
        source_type: CoverageSourceType,
        source_id: uuid::Uuid,
        word_list_id: WordListId,
        config: CoverageConfig,
    ) -> Self {
        Self {
            id: CoverageRunId::new(),
            owner,
            mode,
            source_type,
            source_id,
            word_list_id,
            config,
            state: JobState::Pending,
            progress_percent: 0,
            stats: None,
            dispatched_task_id: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the run as started.
    pub fn begin(&mut self, dispatched_task_id: Option<String>) {
        self.state = JobState::Processing;
        self.dispatched_task_id = dispatched_task_id;
    }

    /// Mark the run as completed with final stats.
    pub fn complete(&mut self, stats: CoverageStats) {
        self.state = JobState::Completed;
        self.progress_percent = 100;
        self.stats = Some(stats);
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed.
    pub fn fail(&mut self) {
        self.state = JobState::Failed;
        self.completed_at = Some(Utc::now());
    }
}

/// One assignment produced by a CoverageRun.
///
/// Unique by `(run_id, word_key)` in [`CoverageMode::Coverage`]; in
/// [`CoverageMode::Filter`] every selected sentence gets its own row and
/// `word_key` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CoverageAssignment {
    /// A word-list key matched to a selected sentence (coverage mode).
    Coverage {
        /// The word-list canonical key.
        word_key: String,
        /// Index of the selected sentence in the source sentence list.
        sentence_index: u32,
        /// The selected sentence's text.
        sentence_text: String,
        /// The sentence's quality score at time of selection.
        sentence_score: f64,
        /// The surface form in the sentence that matched `word_key`.
        matched_surface: String,
        /// Other word keys also satisfied by this sentence.
        conflicts: Vec<String>,
    },
    /// A selected sentence with its acceptance metrics (filter mode).
    Filter {
        /// Index of the selected sentence in the source sentence list.
        sentence_index: u32,
        /// The selected sentence's text.
        sentence_text: String,
        /// Fraction of the sentence's tokens present in the word list.
        in_list_ratio: f64,
        /// Composite ranking score.
        composite_score: f64,
        /// Which multi-pass ordering pass selected this sentence (1-based).
        pass: u8,
    },
}
