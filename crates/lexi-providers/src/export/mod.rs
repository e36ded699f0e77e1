//! Concrete [`ExportClient`] (spreadsheet export, spec.md §6 export
//! endpoints).

use async_trait::async_trait;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::services::ExportClient;
use serde::{Deserialize, Serialize};

/// Reqwest-backed [`ExportClient`] posting to an external spreadsheet
/// generation service and returning the resulting download URL.
pub struct HttpExportClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpExportClient {
    /// Build a new client targeting `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct ExportRequest<'a> {
    title: &'a str,
    rows: &'a [String],
}

#[derive(Deserialize)]
struct ExportResponse {
    url: String,
}

#[async_trait]
impl ExportClient for HttpExportClient {
    async fn export_sentences(&self, title: &str, sentences: &[String]) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ExportRequest {
                title,
                rows: sentences,
            })
            .send()
            .await
            .map_err(|e| Error::export(format!("export request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::export(format!("export endpoint returned {}", response.status())));
        }

        let body: ExportResponse = response
            .json()
            .await
            .map_err(|e| Error::export(format!("failed to parse export response: {e}")))?;
        Ok(body.url)
    }
}
