//! Concrete [`PdfPageExtractor`] backed by the `pdf-extract` crate (C2's
//! byte source).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use lexi_domain::entities::ChunkPayload;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::services::PdfPageExtractor;

/// `pdf-extract`-backed page extractor.
///
/// `pdf-extract` exposes whole-document text extraction, not a
/// page-indexed API; it does, however, emit a form-feed (`\x0c`) between
/// pages in its text output, which this adapter uses as the page
/// boundary. A Chunk's payload therefore holds the already-extracted
/// plain text of its page range (base64-encoded), not raw PDF bytes —
/// documented as an explicit simplification in `DESIGN.md`.
pub struct PdfExtractExtractor;

impl PdfExtractExtractor {
    /// Build a new extractor. Stateless: `pdf-extract` takes the whole
    /// document per call.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_pages(pdf_bytes: &[u8]) -> Result<Vec<String>> {
    let text = pdf_extract::extract_text_from_mem(pdf_bytes)
        .map_err(|e| Error::pdf(format!("pdf-extract failed: {e}")))?;
    Ok(text.split('\u{c}').map(str::to_owned).collect())
}

#[async_trait]
impl PdfPageExtractor for PdfExtractExtractor {
    async fn page_count(&self, pdf_bytes: &[u8]) -> Result<u32> {
        let bytes = pdf_bytes.to_vec();
        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| Error::pdf(format!("pdf extraction task panicked: {e}")))??;
        Ok(pages.len() as u32)
    }

    async fn extract_page_range(&self, pdf_bytes: &[u8], start_page: u32, end_page: u32) -> Result<ChunkPayload> {
        if start_page == 0 || end_page < start_page {
            return Err(Error::invalid_argument(format!(
                "invalid page range {start_page}..={end_page}"
            )));
        }
        let bytes = pdf_bytes.to_vec();
        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| Error::pdf(format!("pdf extraction task panicked: {e}")))??;

        let start = (start_page - 1) as usize;
        let end = (end_page as usize).min(pages.len());
        if start >= pages.len() {
            return Err(Error::pdf(format!(
                "start_page {start_page} exceeds document length ({} pages)",
                pages.len()
            )));
        }
        let text = pages[start..end].join("\n");
        Ok(ChunkPayload::Inline(BASE64.encode(text)))
    }

    async fn payload_to_text(&self, payload: &ChunkPayload) -> Result<String> {
        match payload {
            ChunkPayload::Inline(encoded) => {
                let bytes = BASE64
                    .decode(encoded)
                    .map_err(|e| Error::pdf(format!("invalid base64 chunk payload: {e}")))?;
                String::from_utf8(bytes).map_err(|e| Error::pdf(format!("chunk payload is not valid utf-8: {e}")))
            }
            ChunkPayload::ExternalUrl(url) => {
                let bytes = reqwest::get(url)
                    .await
                    .map_err(|e| Error::pdf(format!("failed to fetch external payload: {e}")))?
                    .bytes()
                    .await
                    .map_err(|e| Error::pdf(format!("failed to read external payload: {e}")))?;
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| Error::pdf(format!("external payload is not valid utf-8: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_split_respects_form_feed_boundaries() {
        let pages = vec!["page one".to_owned(), "page two".to_owned()];
        let joined = pages.join("\u{c}");
        let split: Vec<&str> = joined.split('\u{c}').collect();
        assert_eq!(split, vec!["page one", "page two"]);
    }

    #[tokio::test]
    async fn payload_round_trips_through_base64() {
        let extractor = PdfExtractExtractor::new();
        let payload = ChunkPayload::Inline(BASE64.encode("Bonjour le monde."));
        let text = extractor.payload_to_text(&payload).await.unwrap();
        assert_eq!(text, "Bonjour le monde.");
    }
}
