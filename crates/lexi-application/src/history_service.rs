//! History Snapshot (C7): builds, reads, and refreshes durable
//! History entries from Chunk state (spec.md §4.7).

use std::sync::Arc;

use lexi_domain::entities::{Chunk, ChunkState, History, HistorySentence, Job, SentencesSource};
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::{ChunkRepository, HistoryRepository};
use lexi_domain::value_objects::HistoryId;

use crate::merge::merge_chunks_default;

/// Build a new [`History`] snapshot from a terminal Job's merged sentences.
///
/// Called exactly once by the finalizer, on the first terminal-with-results
/// transition (spec.md §4.7 `snapshot`).
#[must_use]
pub fn build_history_snapshot(
    job: &Job,
    chunks: &[Chunk],
    merged_sentences: Vec<String>,
    error_summary: Option<String>,
) -> History {
    let sentences = merged_sentences
        .into_iter()
        .map(|s| HistorySentence {
            normalized: s.clone(),
            original: s,
        })
        .collect();
    let chunk_ids = chunks.iter().map(|c| c.id).collect();
    History::new_snapshot(
        job.owner,
        job.id,
        job.original_filename.clone(),
        sentences,
        chunk_ids,
        job.settings.clone(),
        error_summary,
    )
}

/// A live-rebuild or snapshot read of a History entry's sentences, tagged
/// with where they came from (spec.md §4.7 `read`).
pub struct HistoryRead {
    /// Sentences, in order.
    pub sentences: Vec<HistorySentence>,
    /// Where they came from.
    pub source: SentencesSource,
}

/// `read(history_id, use_live)`: rebuild from current Chunks when
/// requested and possible, otherwise serve the stored snapshot.
pub async fn read_history(
    history_id: HistoryId,
    use_live: bool,
    history_repo: &Arc<dyn HistoryRepository>,
    chunk_repo: &Arc<dyn ChunkRepository>,
) -> Result<HistoryRead> {
    let history = history_repo.get(history_id).await?;

    if use_live && !history.chunk_ids.is_empty() {
        let mut chunks = Vec::with_capacity(history.chunk_ids.len());
        let mut all_accessible = true;
        for chunk_id in &history.chunk_ids {
            match chunk_repo.get(*chunk_id).await {
                Ok(chunk) => chunks.push(chunk),
                Err(_) => {
                    all_accessible = false;
                    break;
                }
            }
        }
        if all_accessible {
            chunks.sort_by_key(|c: &Chunk| c.chunk_index);
            let merged = merge_chunks_default(&chunks);
            let sentences = merged
                .into_iter()
                .map(|s| HistorySentence {
                    normalized: s.clone(),
                    original: s,
                })
                .collect();
            return Ok(HistoryRead {
                sentences,
                source: SentencesSource::LiveChunks,
            });
        }
    }

    Ok(HistoryRead {
        sentences: history.sentences,
        source: SentencesSource::Snapshot,
    })
}

/// `refresh(history_id)`: rebuild from current Chunks, overwrite the stored
/// snapshot, return the new sentence count.
pub async fn refresh_history(
    history_id: HistoryId,
    history_repo: &Arc<dyn HistoryRepository>,
    chunk_repo: &Arc<dyn ChunkRepository>,
) -> Result<u32> {
    let mut history = history_repo.get(history_id).await?;
    if history.chunk_ids.is_empty() {
        return Err(Error::invalid_argument("history has no chunk references to refresh from"));
    }

    let mut chunks = Vec::with_capacity(history.chunk_ids.len());
    for chunk_id in &history.chunk_ids {
        chunks.push(chunk_repo.get(*chunk_id).await?);
    }
    chunks.sort_by_key(|c| c.chunk_index);
    let success_chunks: Vec<_> = chunks.into_iter().filter(|c| c.state == ChunkState::Success).collect();

    let merged = merge_chunks_default(&success_chunks);
    let sentences = merged
        .into_iter()
        .map(|s| HistorySentence {
            normalized: s.clone(),
            original: s,
        })
        .collect();

    let count = history.apply_refresh(sentences);
    history_repo.update(&history).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexi_domain::entities::ChunkPayload;
    use lexi_domain::value_objects::{ProcessingSettings, UserId};

    #[test]
    fn builds_snapshot_with_original_and_normalized_set_equal() {
        let job = Job::new(UserId::new(), "livre.pdf", ProcessingSettings::default());
        let chunk = Chunk::new_pending(job.id, 0, 1, 1, false, ChunkPayload::Inline("YQ==".to_owned()), 1);
        let history = build_history_snapshot(&job, &[chunk], vec!["Il pleut.".to_owned()], None);
        assert_eq!(history.processed_sentence_count, 1);
        assert_eq!(history.sentences[0].normalized, history.sentences[0].original);
    }
}
