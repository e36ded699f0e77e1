//! `GET /metrics`: Prometheus text exposition, unauthenticated (spec.md §6).

use axum::http::header;
use axum::response::{IntoResponse, Response};
use prometheus::{Encoder, TextEncoder};

use crate::error::ApiError;

/// Render the default Prometheus registry in text exposition format.
pub async fn metrics() -> Result<Response, ApiError> {
    let families = prometheus::gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| lexi_domain::error::Error::infrastructure(format!("metrics encoding failed: {e}")))?;

    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_owned())], buffer).into_response())
}
