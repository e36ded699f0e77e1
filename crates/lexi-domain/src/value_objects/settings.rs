//! Processing settings shared by Jobs and persisted on History snapshots.

use serde::{Deserialize, Serialize};

/// Ordered model tiers used by the LLM Retry Engine (C3, spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelTier {
    /// Fastest / cheapest model
    Speed,
    /// Balanced model (the default user preference)
    Balanced,
    /// Slowest / highest quality model
    Quality,
}

impl ModelTier {
    /// The next heavier tier, if any (used by C3 tier 1 escalation).
    #[must_use]
    pub fn next_heavier(self) -> Option<Self> {
        match self {
            Self::Speed => Some(Self::Balanced),
            Self::Balanced => Some(Self::Quality),
            Self::Quality => None,
        }
    }
}

/// User-controlled settings for one Job (spec.md §3 Job.processing_settings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSettings {
    /// Target sentence length, in words (used by the Coverage Engine's
    /// quality score and by LLM prompting).
    pub sentence_length: u32,
    /// Preferred starting model tier.
    pub model_preference: ModelTier,
    /// Whether to discourage dialogue-style sentences.
    pub ignore_dialogue: bool,
    /// Minimum sentence length, in words, to accept from the LLM.
    pub min_sentence_length: u32,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            sentence_length: 8,
            model_preference: ModelTier::Balanced,
            ignore_dialogue: false,
            min_sentence_length: 3,
        }
    }
}
