//! Cross-cutting constants shared by components (spec.md §4, §6).

/// Retry Engine (C3) taxonomy markers, recorded on [`crate::entities::ChunkResult::fallback_marker`].
pub mod fallback_markers {
    /// Tier 1: next-heavier model, full prompt.
    pub const MODEL_FALLBACK: &str = "MODEL_FALLBACK";
    /// Tier 2: chunk split into subchunks and merged.
    pub const SUBCHUNK_FALLBACK: &str = "SUBCHUNK_FALLBACK";
    /// Tier 3: minimal (extract-and-split only) prompt.
    pub const MINIMAL_PROMPT_FALLBACK: &str = "MINIMAL_PROMPT_FALLBACK";
    /// Tier 4: local regex-based sentence splitter, no LLM.
    pub const LOCAL_FALLBACK: &str = "LOCAL_FALLBACK";
}

/// Default overlap window used by the merge step's fingerprint dedup
/// (spec.md §4.4 merge rules).
pub const DEFAULT_OVERLAP_WINDOW: usize = 8;

/// Default stuck-processing watchdog age, in minutes (spec.md §4.5).
pub const DEFAULT_WATCHDOG_MINUTES: i64 = 60;

/// Default per-chunk soft timeout, in minutes (spec.md §5).
pub const DEFAULT_SOFT_TIMEOUT_MINUTES: i64 = 25;

/// Default per-chunk hard timeout, in minutes (spec.md §5).
pub const DEFAULT_HARD_TIMEOUT_MINUTES: i64 = 30;

/// Fragment-rate threshold above which the Retry Engine logs an error
/// without retrying (spec.md §4.3).
pub const FRAGMENT_RATE_ALERT_THRESHOLD: f64 = 0.05;
