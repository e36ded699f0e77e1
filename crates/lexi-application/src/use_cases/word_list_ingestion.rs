//! WordList ingestion: drives the Linguistic Normalizer (C1) over a raw
//! entry list and assembles the [`IngestionReport`] (spec.md §4.1 step 5,
//! §3 WordList).

use lexi_domain::entities::{IngestionAnomaly, IngestionReport};
use lexi_domain::normalizer::{
    dedup_preserving_first, normalize_word, Lemmatizer, MatchingMode, NormalizeOutcome, NormalizerConfig,
    SurfaceFallbackLemmatizer,
};

/// Normalize every raw entry, dedupe preserving first occurrence, and
/// record the anomalies/variants/multi-token extractions the normalizer
/// flagged along the way.
#[must_use]
pub fn ingest_word_list(raw_entries: &[String], mode: MatchingMode, fold_diacritics: bool) -> (Vec<String>, IngestionReport) {
    let config = NormalizerConfig { fold_diacritics, mode };
    let lemmatizer: Box<dyn Lemmatizer> = Box::new(SurfaceFallbackLemmatizer);

    let mut outcomes: Vec<(usize, NormalizeOutcome)> = Vec::new();
    let mut detected_variants = Vec::new();
    let mut multi_token_head_extractions = Vec::new();
    let mut anomalies = Vec::new();

    for (idx, raw) in raw_entries.iter().enumerate() {
        let variants = normalize_word(raw, &config, lemmatizer.as_ref());
        if variants.is_empty() {
            anomalies.push(IngestionAnomaly {
                raw_entry: raw.clone(),
                description: "normalized to an empty key".to_owned(),
            });
            continue;
        }
        if variants.len() > 1 {
            detected_variants.push(raw.clone());
        }
        for outcome in variants {
            if outcome.multi_token_head_extracted {
                multi_token_head_extractions.push(raw.clone());
            }
            outcomes.push((idx, outcome));
        }
    }

    let original_count = raw_entries.len() as u32;
    let word_keys = dedup_preserving_first(&outcomes);
    let dedup_count = original_count.saturating_sub(word_keys.len() as u32);

    let report = IngestionReport {
        original_count,
        dedup_count,
        detected_variants,
        multi_token_head_extractions,
        anomalies,
    };

    (word_keys, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_and_reports_counts() {
        let raw = vec!["Maison".to_owned(), "maison".to_owned(), "Voiture".to_owned()];
        let (keys, report) = ingest_word_list(&raw, MatchingMode::Surface, true);
        assert_eq!(keys, vec!["maison".to_owned(), "voiture".to_owned()]);
        assert_eq!(report.original_count, 3);
        assert_eq!(report.dedup_count, 1);
    }

    #[test]
    fn variant_split_is_reported() {
        let raw = vec!["chat|chats".to_owned()];
        let (keys, report) = ingest_word_list(&raw, MatchingMode::Surface, true);
        assert_eq!(keys, vec!["chat".to_owned(), "chats".to_owned()]);
        assert_eq!(report.detected_variants, vec!["chat|chats".to_owned()]);
    }
}
