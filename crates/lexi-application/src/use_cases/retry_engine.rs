//! LLM Retry Engine (C3): turns one Chunk's text into a sentence list via a
//! five-tier fallback cascade (spec.md §4.3).

use std::sync::Arc;

use lexi_domain::constants::fallback_markers::{
    LOCAL_FALLBACK, MINIMAL_PROMPT_FALLBACK, MODEL_FALLBACK, SUBCHUNK_FALLBACK,
};
use lexi_domain::constants::FRAGMENT_RATE_ALERT_THRESHOLD;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::services::LlmClient;
use lexi_domain::value_objects::{ModelTier, ProcessingSettings};

/// Outcome of a retry-engine pass over one chunk's text.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    /// Ordered sentences, duplicates preserved (cross-chunk dedup happens
    /// in the merge step, not here).
    pub sentences: Vec<String>,
    /// Taxonomy marker of the tier that ultimately produced the result.
    pub fallback_marker: Option<&'static str>,
    /// Fraction of sentences flagged as likely fragments.
    pub fragment_rate: f64,
}

/// Leading tokens that, without a conjugated verb following shortly after,
/// mark a likely sentence fragment (prepositions, conjunctions, relative
/// pronouns, temporal openers).
const FRAGMENT_LEAD_WORDS: &[&str] = &[
    "et", "mais", "ou", "donc", "car", "que", "qui", "dont", "lorsque", "quand", "pendant",
    "avant", "après", "depuis", "malgré", "sans", "pour", "par", "dans", "sur", "vers",
];

/// French past-participle-ish suffixes used by the dangling-participle check.
const PARTICIPLE_SUFFIXES: &[&str] = &["é", "és", "ée", "ées", "i", "is", "u", "us"];

/// Conjugated-verb heuristics: common finite-verb endings in French.
const FINITE_VERB_SUFFIXES: &[&str] = &[
    "e", "es", "ons", "ez", "ent", "ais", "ait", "aient", "era", "ira", "ont", "ai", "as",
];

/// Heuristically flag `sentence` as a likely grammatical fragment
/// (spec.md §4.3: "detects leading prepositions/conjunctions/relative
/// pronouns without a conjugated verb, dangling past participles, temporal
/// openers without main clause").
#[must_use]
pub fn looks_like_fragment(sentence: &str) -> bool {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.is_empty() {
        return true;
    }
    let has_finite_verb = words
        .iter()
        .any(|w| word_has_any_suffix(&w.to_lowercase(), FINITE_VERB_SUFFIXES) && w.len() > 2);

    let first = words[0].trim_matches(|c: char| !c.is_alphabetic()).to_lowercase();
    let starts_with_fragment_lead = FRAGMENT_LEAD_WORDS.contains(&first.as_str());

    let last = words[words.len() - 1]
        .trim_matches(|c: char| !c.is_alphabetic())
        .to_lowercase();
    let ends_dangling_participle =
        word_has_any_suffix(&last, PARTICIPLE_SUFFIXES) && !has_finite_verb;

    (starts_with_fragment_lead && !has_finite_verb) || ends_dangling_participle
}

fn word_has_any_suffix(word: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|s| word.ends_with(s))
}

/// Compute the fragment rate over a sentence list and log an error (without
/// retrying) if it exceeds the alert threshold.
fn fragment_rate(sentences: &[String]) -> f64 {
    if sentences.is_empty() {
        return 0.0;
    }
    let fragments = sentences.iter().filter(|s| looks_like_fragment(s)).count();
    let rate = fragments as f64 / sentences.len() as f64;
    if rate > FRAGMENT_RATE_ALERT_THRESHOLD {
        tracing::error!(rate, "fragment rate exceeds alert threshold, accepting output as-is");
    }
    rate
}

/// Local regex-based sentence splitter — tier 4, no LLM involved.
#[must_use]
pub fn local_sentence_split(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect()
}

fn split_in_half(text: &str) -> (String, String) {
    let mid = text.len() / 2;
    let split_at = text[..mid]
        .rfind(char::is_whitespace)
        .map_or(mid, |i| i + 1);
    (text[..split_at].to_owned(), text[split_at..].to_owned())
}

async fn call_tier(
    llm: &Arc<dyn LlmClient>,
    tier: ModelTier,
    text: &str,
    settings: &ProcessingSettings,
    minimal: bool,
) -> Result<Vec<String>> {
    if minimal {
        llm.extract_sentences_minimal(tier, text).await
    } else {
        llm.extract_sentences(tier, text, settings).await
    }
}

/// Run the full five-tier fallback cascade over `chunk_text`.
///
/// `allow_local_fallback=false` disables tier 4: a chunk that exhausts
/// tiers 0-3 fails outright instead of falling back to the local splitter
/// (spec.md §6 `allow_local_fallback`).
pub async fn process_chunk_text(
    chunk_text: &str,
    settings: &ProcessingSettings,
    llm: &Arc<dyn LlmClient>,
    allow_local_fallback: bool,
) -> Result<RetryOutcome> {
    // Tier 0: user-preferred model, full prompt.
    match call_tier(llm, settings.model_preference, chunk_text, settings, false).await {
        Ok(sentences) => {
            let rate = fragment_rate(&sentences);
            return Ok(RetryOutcome {
                sentences,
                fallback_marker: None,
                fragment_rate: rate,
            });
        }
        Err(Error::Llm { retryable, .. }) if !retryable => {
            return Err(Error::llm("tier 0 failed non-retryably", "NON_RETRYABLE", false));
        }
        Err(_) => {}
    }

    // Tier 1: next-heavier model, full prompt.
    if let Some(heavier) = settings.model_preference.next_heavier() {
        match call_tier(llm, heavier, chunk_text, settings, false).await {
            Ok(sentences) => {
                let rate = fragment_rate(&sentences);
                return Ok(RetryOutcome {
                    sentences,
                    fallback_marker: Some(MODEL_FALLBACK),
                    fragment_rate: rate,
                });
            }
            Err(Error::Llm { retryable, .. }) if !retryable => {
                return Err(Error::llm("tier 1 failed non-retryably", "NON_RETRYABLE", false));
            }
            Err(_) => {}
        }
    }

    // Tier 2: split into two subchunks, process each (subtiers 0-1), merge.
    let (first_half, second_half) = split_in_half(chunk_text);
    let subchunk_attempt = async {
        let mut merged = Vec::new();
        for half in [first_half.as_str(), second_half.as_str()] {
            if half.trim().is_empty() {
                continue;
            }
            let outcome = Box::pin(process_subchunk(half, settings, llm)).await?;
            merged.extend(outcome);
        }
        Ok::<_, Error>(merged)
    }
    .await;
    if let Ok(sentences) = subchunk_attempt {
        let rate = fragment_rate(&sentences);
        return Ok(RetryOutcome {
            sentences,
            fallback_marker: Some(SUBCHUNK_FALLBACK),
            fragment_rate: rate,
        });
    }

    // Tier 3: original model (then heavier), minimal prompt.
    for tier in [
        settings.model_preference,
        settings
            .model_preference
            .next_heavier()
            .unwrap_or(settings.model_preference),
    ] {
        if let Ok(sentences) = call_tier(llm, tier, chunk_text, settings, true).await {
            let rate = fragment_rate(&sentences);
            return Ok(RetryOutcome {
                sentences,
                fallback_marker: Some(MINIMAL_PROMPT_FALLBACK),
                fragment_rate: rate,
            });
        }
    }

    // Tier 4: local regex-based sentence splitter, no LLM.
    if !allow_local_fallback {
        return Err(Error::llm(
            "all LLM tiers exhausted and local fallback is disabled",
            "ALL_TIERS_EXHAUSTED",
            false,
        ));
    }
    let sentences = local_sentence_split(chunk_text);
    let rate = fragment_rate(&sentences);
    Ok(RetryOutcome {
        sentences,
        fallback_marker: Some(LOCAL_FALLBACK),
        fragment_rate: rate,
    })
}

/// A subchunk only ever escalates through tiers 0-1 (spec.md §4.3: "subtier
/// may itself use tiers 0-1").
async fn process_subchunk(
    text: &str,
    settings: &ProcessingSettings,
    llm: &Arc<dyn LlmClient>,
) -> Result<Vec<String>> {
    if let Ok(sentences) = call_tier(llm, settings.model_preference, text, settings, false).await {
        return Ok(sentences);
    }
    if let Some(heavier) = settings.model_preference.next_heavier() {
        if let Ok(sentences) = call_tier(llm, heavier, text, settings, false).await {
            return Ok(sentences);
        }
    }
    Err(Error::llm("subchunk exhausted tiers 0-1", "SUBCHUNK_EXHAUSTED", true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_detects_leading_conjunction_without_verb() {
        assert!(looks_like_fragment("Et pour la suite"));
    }

    #[test]
    fn fragment_accepts_a_complete_sentence() {
        assert!(!looks_like_fragment("Il mange une pomme"));
    }

    #[test]
    fn local_splitter_produces_terminated_sentences() {
        let out = local_sentence_split("Bonjour. Comment vas-tu? Bien!");
        assert_eq!(out, vec!["Bonjour.", "Comment vas-tu.", "Bien."]);
    }

    #[test]
    fn split_in_half_breaks_on_whitespace() {
        let (a, b) = split_in_half("mot1 mot2 mot3 mot4");
        assert!(a.ends_with(' ') || b.starts_with(char::is_alphabetic));
        assert_eq!(format!("{a}{b}"), "mot1 mot2 mot3 mot4");
    }
}
