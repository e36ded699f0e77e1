//! Merge rules (spec.md §4.4): concatenate chunk sentences in order,
//! dropping duplicates introduced by the chunker's page overlap.

use lexi_domain::constants::DEFAULT_OVERLAP_WINDOW;
use lexi_domain::entities::{Chunk, ChunkState};

/// Stable fingerprint used to detect overlap-induced duplicate sentences:
/// the first 100 characters, casefolded, with whitespace collapsed.
#[must_use]
pub fn fingerprint(sentence: &str) -> String {
    let collapsed: String = sentence
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed.chars().take(100).collect()
}

/// Merge the sentences of all successful Chunks of a Job, in
/// `chunk_index` order, dropping duplicates across an overlap boundary.
///
/// Chunks not in state [`ChunkState::Success`] are skipped, preserving
/// positional order of the remaining chunks (spec.md §4.4). `chunks` must
/// already be sorted by `chunk_index`.
#[must_use]
pub fn merge_chunks(chunks: &[Chunk], overlap_window: usize) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut prev_tail_fingerprints: Vec<String> = Vec::new();

    for chunk in chunks {
        if chunk.state != ChunkState::Success {
            continue;
        }
        let Some(result) = &chunk.result else { continue };

        if chunk.has_overlap && !prev_tail_fingerprints.is_empty() {
            for sentence in &result.sentences {
                let fp = fingerprint(sentence);
                if !prev_tail_fingerprints.contains(&fp) {
                    merged.push(sentence.clone());
                }
            }
        } else {
            merged.extend(result.sentences.iter().cloned());
        }

        prev_tail_fingerprints = merged
            .iter()
            .rev()
            .take(overlap_window)
            .map(|s| fingerprint(s))
            .collect();
    }

    merged
}

/// Merge using the spec's default overlap window (8).
#[must_use]
pub fn merge_chunks_default(chunks: &[Chunk]) -> Vec<String> {
    merge_chunks(chunks, DEFAULT_OVERLAP_WINDOW)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexi_domain::entities::{ChunkPayload, ChunkResult};
    use lexi_domain::value_objects::JobId;

    fn success_chunk(job_id: JobId, index: u32, has_overlap: bool, sentences: Vec<&str>) -> Chunk {
        let mut chunk = Chunk::new_pending(
            job_id,
            index,
            1,
            10,
            has_overlap,
            ChunkPayload::Inline("YWJj".to_owned()),
            10,
        );
        chunk.claim("t").unwrap();
        chunk
            .complete(ChunkResult {
                sentences: sentences.into_iter().map(str::to_owned).collect(),
                token_count: 0,
                start_page: 1,
                end_page: 10,
                fallback_marker: None,
            })
            .unwrap();
        chunk
    }

    #[test]
    fn merges_in_order_without_overlap() {
        let job_id = JobId::new();
        let chunks = vec![
            success_chunk(job_id, 0, false, vec!["Un.", "Deux."]),
            success_chunk(job_id, 1, false, vec!["Trois."]),
        ];
        let merged = merge_chunks_default(&chunks);
        assert_eq!(merged, vec!["Un.", "Deux.", "Trois."]);
    }

    #[test]
    fn drops_duplicate_sentence_across_overlap_boundary() {
        let job_id = JobId::new();
        let chunks = vec![
            success_chunk(job_id, 0, false, vec!["Il fait beau.", "Le chat dort."]),
            success_chunk(job_id, 1, true, vec!["Le chat dort.", "Nouvelle phrase."]),
        ];
        let merged = merge_chunks_default(&chunks);
        assert_eq!(merged, vec!["Il fait beau.", "Le chat dort.", "Nouvelle phrase."]);
    }

    #[test]
    fn skips_failed_chunks_preserving_order() {
        let job_id = JobId::new();
        let mut failed = Chunk::new_pending(
            job_id,
            1,
            11,
            20,
            true,
            ChunkPayload::Inline("YWJj".to_owned()),
            10,
        );
        failed.claim("t").unwrap();
        failed.fail("boom", "API_ERROR").unwrap();

        let chunks = vec![
            success_chunk(job_id, 0, false, vec!["Un."]),
            failed,
            success_chunk(job_id, 2, true, vec!["Deux."]),
        ];
        let merged = merge_chunks_default(&chunks);
        assert_eq!(merged, vec!["Un.", "Deux."]);
    }
}
