//! Coverage Engine (C8): two pure algorithms over (sentences, word-list,
//! config) → (assignments, stats) — greedy set-cover and multi-pass
//! acceptance filtering (spec.md §4.8).

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use lexi_domain::entities::{CoverageAssignment, CoverageModeConfig, CoverageStats, FilterModeConfig};
use lexi_domain::normalizer::{normalize_sentence, Lemmatizer, NormalizerConfig};

const DIALOGUE_MARKERS: &[char] = &['\u{2014}', '\u{2013}', '-'];
const HILL_CLIMB_MAX_ITERATIONS: usize = 200;

struct SentenceFeatures {
    index: usize,
    text: String,
    tokens: Vec<String>,
}

fn tokenize_all(
    sentences: &[String],
    normalizer_config: &NormalizerConfig,
    lemmatizer: &dyn Lemmatizer,
) -> Vec<SentenceFeatures> {
    sentences
        .iter()
        .enumerate()
        .map(|(index, text)| SentenceFeatures {
            index,
            text: text.clone(),
            tokens: normalize_sentence(text, normalizer_config, lemmatizer),
        })
        .collect()
}

fn build_inverted_index<'a>(
    features: &'a [SentenceFeatures],
    word_keys: &HashSet<String>,
) -> HashMap<&'a str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for f in features {
        let mut seen_in_sentence = HashSet::new();
        for token in &f.tokens {
            if word_keys.contains(token) && seen_in_sentence.insert(token.as_str()) {
                index.entry(token.as_str()).or_default().push(f.index);
            }
        }
    }
    index
}

fn has_dialogue_marker(text: &str) -> bool {
    text.trim_start().starts_with(DIALOGUE_MARKERS)
}

fn quality_score(f: &SentenceFeatures, target_length: u32, prefer_non_dialogue: bool) -> f64 {
    let len = f.tokens.len() as f64;
    let proximity = 1.0 / (1.0 + (len - target_length as f64).abs());
    let dialogue_penalty = if prefer_non_dialogue && has_dialogue_marker(&f.text) {
        0.3
    } else {
        0.0
    };
    (proximity - dialogue_penalty).max(0.0)
}

fn length_penalty(f: &SentenceFeatures, target_length: u32) -> f64 {
    (f.tokens.len() as f64 - target_length as f64).abs() / target_length.max(1) as f64
}

/// Run the greedy set-cover (`coverage`) mode (spec.md §4.8).
#[must_use]
pub fn run_coverage_mode(
    sentences: &[String],
    word_keys: &[String],
    config: &CoverageModeConfig,
    prefer_non_dialogue: bool,
    normalizer_config: &NormalizerConfig,
    lemmatizer: &dyn Lemmatizer,
) -> (Vec<CoverageAssignment>, CoverageStats) {
    let started = Instant::now();
    let key_set: HashSet<String> = word_keys.iter().cloned().collect();
    let features = tokenize_all(sentences, normalizer_config, lemmatizer);
    let inverted = build_inverted_index(&features, &key_set);
    let scores: HashMap<usize, f64> = features
        .iter()
        .map(|f| (f.index, quality_score(f, config.target_length, prefer_non_dialogue)))
        .collect();
    let penalties: HashMap<usize, f64> = features
        .iter()
        .map(|f| (f.index, length_penalty(f, config.target_length)))
        .collect();

    let mut covered: HashSet<&str> = HashSet::new();
    let mut assignment_of: HashMap<&str, (usize, Vec<&str>)> = HashMap::new();
    let mut selected: Vec<usize> = Vec::new();

    loop {
        if selected.len() as u32 >= config.max_sentences {
            break;
        }

        let mut best: Option<(usize, f64, f64, f64)> = None; // (index, composite, q, len_penalty)
        for f in &features {
            if selected.contains(&f.index) {
                continue;
            }
            let uncovered_here: Vec<&str> = f
                .tokens
                .iter()
                .filter(|t| key_set.contains(t.as_str()) && !covered.contains(t.as_str()))
                .map(String::as_str)
                .collect();
            let gain = uncovered_here.len() as f64;
            if gain == 0.0 {
                continue;
            }
            let duplicate_penalty = f
                .tokens
                .iter()
                .filter(|t| key_set.contains(t.as_str()) && covered.contains(t.as_str()))
                .count() as f64;
            let q = scores[&f.index];
            let len_pen = penalties[&f.index];
            let composite = gain - config.alpha * duplicate_penalty + config.beta * q - config.gamma * len_pen;

            // Tie-break: higher composite, then higher quality, then lower
            // length penalty, then lower sentence index (the default by
            // virtue of iterating `features` in index order and only ever
            // replacing on strict improvement).
            let better = match best {
                None => true,
                Some((_, best_composite, best_q, best_len_pen)) => {
                    composite > best_composite
                        || (composite == best_composite && q > best_q)
                        || (composite == best_composite && q == best_q && len_pen < best_len_pen)
                }
            };
            if better {
                best = Some((f.index, composite, q, len_pen));
            }
        }

        let Some((winner_idx, _, _, _)) = best else { break };
        let winner = &features[winner_idx];
        let newly_covered: Vec<&str> = winner
            .tokens
            .iter()
            .filter(|t| key_set.contains(t.as_str()) && !covered.contains(t.as_str()))
            .map(String::as_str)
            .collect();
        for key in &newly_covered {
            covered.insert(key);
        }
        let all_keys_in_sentence: Vec<&str> = winner
            .tokens
            .iter()
            .filter(|t| key_set.contains(t.as_str()))
            .map(String::as_str)
            .collect();
        for key in &newly_covered {
            let conflicts: Vec<&str> = all_keys_in_sentence
                .iter()
                .filter(|k| *k != key)
                .copied()
                .collect();
            assignment_of.insert(key, (winner_idx, conflicts));
        }
        selected.push(winner_idx);
    }

    reduce_duplicates(&mut assignment_of, &inverted, &covered);

    let assignments: Vec<CoverageAssignment> = assignment_of
        .into_iter()
        .map(|(key, (idx, conflicts))| {
            let f = &features[idx];
            CoverageAssignment::Coverage {
                word_key: key.to_owned(),
                sentence_index: idx as u32,
                sentence_text: f.text.clone(),
                sentence_score: scores[&idx],
                matched_surface: key.to_owned(),
                conflicts: conflicts.into_iter().map(ToOwned::to_owned).collect(),
            }
        })
        .collect();

    let uncovered_word_keys: Vec<String> = word_keys.iter().filter(|k| !covered.contains(k.as_str())).cloned().collect();
    let stats = CoverageStats {
        total_sentences: sentences.len() as u32,
        total_word_keys: word_keys.len() as u32,
        covered_word_keys: covered.len() as u32,
        uncovered_word_keys,
        acceptance_ratio: if sentences.is_empty() {
            0.0
        } else {
            selected.len() as f64 / sentences.len() as f64
        },
        runtime_ms: started.elapsed().as_millis() as u64,
    };

    (assignments, stats)
}

/// Single-swap hill climb: for each key assigned to a sentence shared with
/// other keys, try to move it to a sentence that covers no other key,
/// reducing duplicate-sentence usage without losing coverage. Bounded by
/// [`HILL_CLIMB_MAX_ITERATIONS`].
fn reduce_duplicates<'a>(
    assignment_of: &mut HashMap<&'a str, (usize, Vec<&'a str>)>,
    inverted: &HashMap<&'a str, Vec<usize>>,
    _covered: &HashSet<&'a str>,
) {
    let keys: Vec<&str> = assignment_of.keys().copied().collect();
    let mut iterations = 0;
    for key in keys {
        if iterations >= HILL_CLIMB_MAX_ITERATIONS {
            break;
        }
        iterations += 1;
        let Some((current_idx, conflicts)) = assignment_of.get(key).cloned() else { continue };
        if conflicts.is_empty() {
            continue;
        }
        let Some(candidates) = inverted.get(key) else { continue };
        for &candidate_idx in candidates {
            if candidate_idx == current_idx {
                continue;
            }
            let already_used = assignment_of.values().any(|(idx, _)| *idx == candidate_idx);
            if !already_used {
                assignment_of.insert(key, (candidate_idx, Vec::new()));
                break;
            }
        }
    }
}

/// Run the multi-pass acceptance-filter (`filter`) mode (spec.md §4.8).
#[must_use]
pub fn run_filter_mode(
    sentences: &[String],
    word_keys: &[String],
    config: &FilterModeConfig,
    normalizer_config: &NormalizerConfig,
    lemmatizer: &dyn Lemmatizer,
) -> (Vec<CoverageAssignment>, CoverageStats) {
    let started = Instant::now();
    let key_set: HashSet<String> = word_keys.iter().cloned().collect();
    let features = tokenize_all(sentences, normalizer_config, lemmatizer);

    let mut candidates: Vec<(usize, f64, f64)> = Vec::new(); // (index, in_list_ratio, composite)
    for f in &features {
        let token_count = f.tokens.len() as u32;
        if token_count < config.len_min || token_count > config.len_max {
            continue;
        }
        let in_list = f.tokens.iter().filter(|t| key_set.contains(t.as_str())).count();
        let ratio = if f.tokens.is_empty() {
            0.0
        } else {
            in_list as f64 / f.tokens.len() as f64
        };
        if ratio < config.min_in_list_ratio {
            continue;
        }
        let frequency_weight = in_list as f64 / (f.tokens.len().max(1) as f64);
        let composite = ratio * 10.0 + (1.0 / f.tokens.len().max(1) as f64) * 0.5 + frequency_weight;
        candidates.push((f.index, ratio, composite));
    }

    let mut selected: Vec<CoverageAssignment> = Vec::new();
    let mut selected_fingerprints: Vec<String> = Vec::new();

    for pass in 1..=3u8 {
        if selected.len() as u32 >= config.target_count {
            break;
        }
        let target_len = match pass {
            1 => 4,
            2 => 3,
            _ => 0,
        };
        let mut pass_candidates: Vec<_> = candidates
            .iter()
            .filter(|(idx, _, _)| {
                let len = features[*idx].tokens.len() as u32;
                if pass == 3 {
                    true
                } else {
                    len == target_len
                }
            })
            .filter(|(idx, _, _)| !is_already_selected(*idx, &selected))
            .collect();
        pass_candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap().then(a.0.cmp(&b.0)));

        for (idx, ratio, composite) in pass_candidates {
            if selected.len() as u32 >= config.target_count {
                break;
            }
            let fp = crate::merge::fingerprint(&features[*idx].text);
            if diversity_conflict(&fp, &selected_fingerprints) {
                continue;
            }
            selected_fingerprints.push(fp);
            selected.push(CoverageAssignment::Filter {
                sentence_index: *idx as u32,
                sentence_text: features[*idx].text.clone(),
                in_list_ratio: *ratio,
                composite_score: *composite,
                pass,
            });
        }
    }

    let total_word_keys = word_keys.len() as u32;
    let covered_word_keys = word_keys
        .iter()
        .filter(|k| {
            selected.iter().any(|a| match a {
                CoverageAssignment::Filter { sentence_index, .. } => {
                    features[*sentence_index as usize].tokens.iter().any(|t| t == *k)
                }
                CoverageAssignment::Coverage { .. } => false,
            })
        })
        .count() as u32;

    let stats = CoverageStats {
        total_sentences: sentences.len() as u32,
        total_word_keys,
        covered_word_keys,
        uncovered_word_keys: word_keys
            .iter()
            .filter(|k| {
                !selected.iter().any(|a| match a {
                    CoverageAssignment::Filter { sentence_index, .. } => {
                        features[*sentence_index as usize].tokens.iter().any(|t| t == *k)
                    }
                    CoverageAssignment::Coverage { .. } => false,
                })
            })
            .cloned()
            .collect(),
        acceptance_ratio: if sentences.is_empty() {
            0.0
        } else {
            selected.len() as f64 / sentences.len() as f64
        },
        runtime_ms: started.elapsed().as_millis() as u64,
    };

    (selected, stats)
}

fn is_already_selected(idx: usize, selected: &[CoverageAssignment]) -> bool {
    selected.iter().any(|a| match a {
        CoverageAssignment::Filter { sentence_index, .. } => *sentence_index as usize == idx,
        CoverageAssignment::Coverage { .. } => false,
    })
}

fn diversity_conflict(fp: &str, selected_fingerprints: &[String]) -> bool {
    selected_fingerprints.iter().any(|existing| jaccard_over_chars(fp, existing) > 0.9)
}

fn jaccard_over_chars(a: &str, b: &str) -> f64 {
    let a_set: HashSet<char> = a.chars().collect();
    let b_set: HashSet<char> = b.chars().collect();
    if a_set.is_empty() && b_set.is_empty() {
        return 1.0;
    }
    let intersection = a_set.intersection(&b_set).count() as f64;
    let union = a_set.union(&b_set).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexi_domain::normalizer::SurfaceFallbackLemmatizer;

    fn cfg() -> NormalizerConfig {
        NormalizerConfig::default()
    }

    #[test]
    fn coverage_mode_selects_sentences_covering_all_keys() {
        let sentences = vec![
            "Le chat dort sur le lit.".to_owned(),
            "Le chien court dans le jardin.".to_owned(),
            "Une phrase sans rapport.".to_owned(),
        ];
        let word_keys = vec!["chat".to_owned(), "chien".to_owned()];
        let config = CoverageModeConfig::default();
        let (assignments, stats) =
            run_coverage_mode(&sentences, &word_keys, &config, false, &cfg(), &SurfaceFallbackLemmatizer);
        assert_eq!(assignments.len(), 2);
        assert_eq!(stats.covered_word_keys, 2);
        assert!(stats.uncovered_word_keys.is_empty());
    }

    #[test]
    fn coverage_mode_reports_uncovered_keys() {
        let sentences = vec!["Une phrase neutre.".to_owned()];
        let word_keys = vec!["inexistant".to_owned()];
        let config = CoverageModeConfig::default();
        let (assignments, stats) =
            run_coverage_mode(&sentences, &word_keys, &config, false, &cfg(), &SurfaceFallbackLemmatizer);
        assert!(assignments.is_empty());
        assert_eq!(stats.uncovered_word_keys, vec!["inexistant".to_owned()]);
    }

    #[test]
    fn filter_mode_accepts_short_high_ratio_sentences() {
        let sentences = vec!["Le chat dort.".to_owned(), "Une phrase plus longue et complexe ici.".to_owned()];
        let word_keys = vec!["le".to_owned(), "chat".to_owned(), "dort".to_owned()];
        let config = FilterModeConfig {
            min_in_list_ratio: 0.5,
            len_min: 2,
            len_max: 4,
            target_count: 10,
        };
        let (selected, stats) =
            run_filter_mode(&sentences, &word_keys, &config, &cfg(), &SurfaceFallbackLemmatizer);
        assert_eq!(selected.len(), 1);
        assert_eq!(stats.total_sentences, 2);
    }

    #[test]
    fn filter_mode_respects_target_count() {
        let sentences: Vec<String> = (0..10).map(|_| "Le chat dort.".to_owned()).collect();
        let word_keys = vec!["le".to_owned(), "chat".to_owned(), "dort".to_owned()];
        let config = FilterModeConfig {
            min_in_list_ratio: 0.5,
            len_min: 2,
            len_max: 4,
            target_count: 3,
        };
        let (selected, _) = run_filter_mode(&sentences, &word_keys, &config, &cfg(), &SurfaceFallbackLemmatizer);
        assert!(selected.len() <= 3);
    }
}
