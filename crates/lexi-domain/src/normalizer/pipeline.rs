//! The five-step canonicalization pipeline (spec.md §4.1).

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use super::lemma::Lemmatizer;
use super::NormalizerConfig;

const ELISION_PREFIXES: &[&str] = &["l'", "d'", "j'", "n'", "s'", "t'", "c'", "qu'"];
const VARIANT_SPLIT: &[char] = &['|', '/', ','];

fn numeric_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\s*[-.:)\]]*\s*").expect("static regex"))
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{FEFF}')
}

const QUOTE_CHARS: &[char] = &['"', '\'', '\u{2018}', '\u{2019}', '\u{00AB}', '\u{00BB}', '\u{201C}', '\u{201D}'];

/// Result of normalizing one raw entry into one canonical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOutcome {
    /// Final canonical key.
    pub key: String,
    /// The raw variant this outcome was derived from (post variant-split).
    pub variant: String,
    /// Whether a multi-token head extraction occurred.
    pub multi_token_head_extracted: bool,
    /// Whether the lemma model had no entry and the surface form was used.
    pub lemma_fallback: bool,
}

/// Step 1-3: strip whitespace/zero-width chars, surrounding quotes, and a
/// leading numeric prefix. Returns the remaining text with variants intact.
fn strip_header(raw: &str) -> String {
    let trimmed: String = raw
        .trim()
        .chars()
        .filter(|c| !is_zero_width(*c))
        .collect();
    let trimmed = trimmed.trim();
    let without_prefix = numeric_prefix_re().replace(trimmed, "");
    let mut s = without_prefix.trim();
    loop {
        let start_stripped = s
            .strip_prefix(QUOTE_CHARS)
            .map(str::trim_start)
            .unwrap_or(s);
        let end_stripped = start_stripped
            .strip_suffix(QUOTE_CHARS)
            .map(str::trim_end)
            .unwrap_or(start_stripped);
        if end_stripped == s {
            break;
        }
        s = end_stripped;
    }
    s.to_owned()
}

/// Steps 4a-4f applied to a single variant (after splitting on
/// `{|, /, ,}`). Returns `None` if the variant is empty after stripping.
fn normalize_variant(
    variant: &str,
    config: &NormalizerConfig,
    lemmatizer: &dyn Lemmatizer,
) -> Option<NormalizeOutcome> {
    let variant = variant.trim();
    if variant.is_empty() {
        return None;
    }

    // 4a: extract head token after any elision prefix, before removing
    // internal apostrophes.
    let lower_head = variant.to_lowercase();
    let after_elision = ELISION_PREFIXES
        .iter()
        .find_map(|prefix| lower_head.strip_prefix(prefix).map(|_| &variant[prefix.len()..]))
        .unwrap_or(variant);

    // 4b: remove remaining internal apostrophes.
    let no_apostrophes: String = after_elision
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2018}' | '\u{2019}'))
        .collect();

    // 4c: case-fold (Unicode).
    let casefolded = no_apostrophes.to_lowercase();

    // 4d: optionally decompose and drop combining marks.
    let diacritic_folded = if config.fold_diacritics {
        casefolded
            .nfd()
            .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
            .collect::<String>()
    } else {
        casefolded
    };

    // 4e: if multi-token remains, take the first lexical token.
    let tokens: Vec<&str> = diacritic_folded
        .split_whitespace()
        .filter(|t| !t.is_empty())
        .collect();
    let (head, multi_token_head_extracted) = match tokens.as_slice() {
        [] => (diacritic_folded.trim().to_owned(), false),
        [single] => ((*single).to_owned(), false),
        [first, ..] => ((*first).to_owned(), true),
    };

    if head.is_empty() {
        return None;
    }

    // 4f: lemmatize, falling back to the surface form.
    let (key, lemma_fallback) = match config.mode {
        super::MatchingMode::Surface => (head.clone(), false),
        super::MatchingMode::Lemma => match lemmatizer.lemmatize(&head) {
            Some(lemma) => (lemma, false),
            None => (head.clone(), true),
        },
    };

    Some(NormalizeOutcome {
        key,
        variant: variant.to_owned(),
        multi_token_head_extracted,
        lemma_fallback,
    })
}

/// Normalize a single raw word-list entry, expanding `{|, /, ,}`-separated
/// variants into one [`NormalizeOutcome`] per variant. Never panics: an
/// entry that normalizes to nothing produces an empty vec rather than an
/// error, per the "must not fail on anomalies" contract.
#[must_use]
pub fn normalize_word(
    raw: &str,
    config: &NormalizerConfig,
    lemmatizer: &dyn Lemmatizer,
) -> Vec<NormalizeOutcome> {
    let header_stripped = strip_header(raw);
    header_stripped
        .split(VARIANT_SPLIT)
        .filter_map(|variant| normalize_variant(variant, config, lemmatizer))
        .collect()
}

/// Tokenize a sentence and normalize each token to its canonical key, in
/// order (duplicates preserved — callers that need a set should dedupe).
/// Used by the Coverage Engine (§4.8) to build its inverted index.
#[must_use]
pub fn normalize_sentence(
    text: &str,
    config: &NormalizerConfig,
    lemmatizer: &dyn Lemmatizer,
) -> Vec<String> {
    text.unicode_words()
        .filter_map(|word| normalize_variant(word, config, lemmatizer))
        .map(|outcome| outcome.key)
        .collect()
}

/// Deduplicate a batch of raw entries, preserving the lowest original index
/// for each final key (step 5 of §4.1, applied at the WordList ingestion
/// boundary rather than per-call since dedup is cross-entry).
#[must_use]
pub fn dedup_preserving_first(outcomes: &[(usize, NormalizeOutcome)]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ordered: Vec<(usize, &str)> = outcomes
        .iter()
        .filter(|(_, o)| seen.insert(o.key.clone()))
        .map(|(idx, o)| (*idx, o.key.as_str()))
        .collect();
    ordered.sort_by_key(|(idx, _)| *idx);
    ordered.into_iter().map(|(_, key)| key.to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::lemma::SurfaceFallbackLemmatizer;
    use crate::normalizer::{MatchingMode, NormalizerConfig};

    fn cfg() -> NormalizerConfig {
        NormalizerConfig {
            fold_diacritics: true,
            mode: MatchingMode::Lemma,
        }
    }

    #[test]
    fn strips_numeric_prefix_and_quotes() {
        let out = normalize_word("1. \"Maison\"", &cfg(), &SurfaceFallbackLemmatizer);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "maison");
    }

    #[test]
    fn handles_elision_before_removing_apostrophes() {
        let out = normalize_word("l'arbre", &cfg(), &SurfaceFallbackLemmatizer);
        assert_eq!(out[0].key, "arbre");
    }

    #[test]
    fn splits_pipe_separated_variants() {
        let out = normalize_word("chat|chats", &cfg(), &SurfaceFallbackLemmatizer);
        let keys: Vec<_> = out.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["chat", "chats"]);
    }

    #[test]
    fn folds_diacritics_when_enabled() {
        let out = normalize_word("été", &cfg(), &SurfaceFallbackLemmatizer);
        assert_eq!(out[0].key, "ete");
    }

    #[test]
    fn keeps_diacritics_when_disabled() {
        let config = NormalizerConfig {
            fold_diacritics: false,
            mode: MatchingMode::Lemma,
        };
        let out = normalize_word("été", &config, &SurfaceFallbackLemmatizer);
        assert_eq!(out[0].key, "été");
    }

    #[test]
    fn multi_token_extracts_first_lexical_token() {
        let out = normalize_word("pomme de terre", &cfg(), &SurfaceFallbackLemmatizer);
        assert_eq!(out[0].key, "pomme");
        assert!(out[0].multi_token_head_extracted);
    }

    #[test]
    fn lemma_fallback_reports_surface_form() {
        let out = normalize_word("maisons", &cfg(), &SurfaceFallbackLemmatizer);
        assert!(out[0].lemma_fallback);
        assert_eq!(out[0].key, "maisons");
    }

    #[test]
    fn never_fails_on_empty_or_punctuation_only_input() {
        let out = normalize_word("   !!!   ", &cfg(), &SurfaceFallbackLemmatizer);
        assert!(out.is_empty());
    }

    #[test]
    fn normalize_sentence_tokenizes_and_normalizes_each_word() {
        let keys = normalize_sentence("L'été est arrivé.", &cfg(), &SurfaceFallbackLemmatizer);
        assert_eq!(keys, vec!["ete", "est", "arrive"]);
    }

    #[test]
    fn dedup_preserves_lowest_index() {
        let a = normalize_word("chat", &cfg(), &SurfaceFallbackLemmatizer).remove(0);
        let b = normalize_word("Chat", &cfg(), &SurfaceFallbackLemmatizer).remove(0);
        let indexed = vec![(0usize, a), (1usize, b)];
        let deduped = dedup_preserving_first(&indexed);
        assert_eq!(deduped, vec!["chat"]);
    }
}
