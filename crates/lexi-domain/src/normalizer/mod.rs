//! Linguistic Normalizer (C1): canonicalizes a raw French word or sentence
//! token into a key usable for equality-based matching.
//!
//! The pipeline below is contractual — each step's output feeds the next
//! (spec.md §4.1).

mod lemma;
mod pipeline;

pub use lemma::{Lemmatizer, SurfaceFallbackLemmatizer};
pub use pipeline::{dedup_preserving_first, normalize_sentence, normalize_word, NormalizeOutcome};

use serde::{Deserialize, Serialize};

/// Matching mode consumers of the normalizer must pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMode {
    /// Match on the lemmatized form (default).
    Lemma,
    /// Match on the surface (post-casefold/diacritic-fold) form.
    Surface,
}

impl Default for MatchingMode {
    fn default() -> Self {
        Self::Lemma
    }
}

/// Configuration governing diacritic folding during normalization.
#[derive(Debug, Clone, Copy)]
pub struct NormalizerConfig {
    /// Drop combining diacritical marks after NFD decomposition.
    pub fold_diacritics: bool,
    /// Matching mode to report the final key under.
    pub mode: MatchingMode,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fold_diacritics: true,
            mode: MatchingMode::Lemma,
        }
    }
}
