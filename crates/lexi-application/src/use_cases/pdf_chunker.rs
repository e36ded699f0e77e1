//! PDF Chunker (C2): splits a PDF into page-range Chunks with a 1-page
//! overlap between adjacent chunks (spec.md §4.2).

use std::sync::Arc;

use lexi_domain::entities::{Chunk, ChunkPayload};
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::repositories::ChunkRepository;
use lexi_domain::ports::services::PdfPageExtractor;
use lexi_domain::value_objects::JobId;

/// Chunk-size strategy chosen by total page count (spec.md §4.2).
#[must_use]
pub fn pages_per_chunk(total_pages: u32) -> u32 {
    match total_pages {
        0..=30 => 30,
        31..=100 => 20,
        _ => 15,
    }
}

/// One planned chunk boundary before payload extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkBounds {
    index: u32,
    start_page: u32,
    end_page: u32,
    has_overlap: bool,
}

fn plan_chunks(total_pages: u32) -> Vec<ChunkBounds> {
    if total_pages == 0 {
        return Vec::new();
    }
    let size = pages_per_chunk(total_pages);
    let mut bounds = Vec::new();
    let mut start_page = 1u32;
    let mut index = 0u32;
    while start_page <= total_pages {
        let end_page = (start_page + size - 1).min(total_pages);
        bounds.push(ChunkBounds {
            index,
            start_page,
            end_page,
            has_overlap: index > 0,
        });
        if end_page >= total_pages {
            break;
        }
        // 1-page overlap: the next chunk starts at this chunk's end page.
        start_page = end_page;
        index += 1;
    }
    bounds
}

/// Result of a chunking pass: the persisted Chunks, or the in-memory
/// fallback list used when persistence failed (spec.md §4.2 degraded mode).
pub struct ChunkPlan {
    /// Planned Chunks, in `chunk_index` order.
    pub chunks: Vec<Chunk>,
    /// Set when bulk persistence failed and the orchestrator must run this
    /// Job without per-chunk durability.
    pub degraded_mode: bool,
}

/// Split `pdf_bytes` into Chunk rows and persist them in a single
/// transaction. Falls back to an in-memory plan (degraded mode) if
/// persistence fails, per spec.md §4.2.
pub async fn chunk_pdf(
    job_id: JobId,
    pdf_bytes: &[u8],
    extractor: &Arc<dyn PdfPageExtractor>,
    chunk_repo: &Arc<dyn ChunkRepository>,
) -> Result<ChunkPlan> {
    let total_pages = extractor.page_count(pdf_bytes).await?;
    if total_pages == 0 {
        return Err(Error::pdf("document has no pages"));
    }

    let bounds = plan_chunks(total_pages);
    let mut chunks = Vec::with_capacity(bounds.len());
    for b in &bounds {
        let payload = extractor
            .extract_page_range(pdf_bytes, b.start_page, b.end_page)
            .await?;
        let file_size_bytes = match &payload {
            ChunkPayload::Inline(b64) => b64.len() as u64,
            ChunkPayload::ExternalUrl(_) => 0,
        };
        chunks.push(Chunk::new_pending(
            job_id,
            b.index,
            b.start_page,
            b.end_page,
            b.has_overlap,
            payload,
            file_size_bytes,
        ));
    }

    match chunk_repo.insert_batch(&chunks).await {
        Ok(()) => Ok(ChunkPlan {
            chunks,
            degraded_mode: false,
        }),
        Err(err) => {
            tracing::error!(error = %err, job_id = %job_id, "chunk persistence failed, falling back to degraded mode");
            Ok(ChunkPlan {
                chunks,
                degraded_mode: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_for_small_documents() {
        assert_eq!(pages_per_chunk(1), 30);
        assert_eq!(pages_per_chunk(30), 30);
        let bounds = plan_chunks(10);
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].start_page, 1);
        assert_eq!(bounds[0].end_page, 10);
        assert!(!bounds[0].has_overlap);
    }

    #[test]
    fn twenty_pages_per_chunk_in_mid_range() {
        assert_eq!(pages_per_chunk(50), 20);
        let bounds = plan_chunks(50);
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0].start_page, 1);
        assert_eq!(bounds[0].end_page, 20);
        assert_eq!(bounds[1].start_page, 20);
        assert!(bounds[1].has_overlap);
        assert_eq!(bounds[1].end_page, 39);
        assert_eq!(bounds[2].start_page, 39);
        assert_eq!(bounds[2].end_page, 50);
    }

    #[test]
    fn fifteen_pages_per_chunk_for_large_documents() {
        assert_eq!(pages_per_chunk(101), 15);
        assert_eq!(pages_per_chunk(500), 15);
        let bounds = plan_chunks(101);
        assert!(bounds.len() >= 2);
        for window in bounds.windows(2) {
            assert_eq!(window[1].start_page, window[0].end_page);
            assert!(window[1].has_overlap);
        }
    }

    #[test]
    fn chunk_indices_are_zero_based_and_contiguous() {
        let bounds = plan_chunks(80);
        for (i, b) in bounds.iter().enumerate() {
            assert_eq!(b.index, i as u32);
        }
    }
}
