//! HTTP/JSON API and WebSocket Progress Bus (spec.md §6).
//!
//! [`build_router`] is the crate's single public entry point: it wires
//! every route onto `state` and applies CORS/tracing middleware. The
//! `lexi` binary owns listening and serving.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Assemble the full router over `state`. Does not bind a listener.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/process-pdf-async", post(routes::jobs::start_job))
        .route("/jobs/{id}", get(routes::jobs::get_job))
        .route("/jobs/{id}/cancel", post(routes::jobs::cancel_job))
        .route("/jobs/{id}/chunks", get(routes::jobs::list_chunks))
        .route("/jobs/{id}/chunks/retry", post(routes::jobs::retry_chunks))
        .route("/history/{id}", get(routes::history::get_history))
        .route("/history/{id}/refresh", post(routes::history::refresh))
        .route("/history/{id}/export", post(routes::history::export))
        .route("/wordlists", get(routes::word_lists::list_word_lists).post(routes::word_lists::create_word_list))
        .route(
            "/wordlists/{id}",
            get(routes::word_lists::get_word_list)
                .patch(routes::word_lists::rename_word_list)
                .delete(routes::word_lists::delete_word_list),
        )
        .route("/wordlists/{id}/refresh", post(routes::word_lists::refresh_word_list))
        .route("/coverage/run", post(routes::coverage::start_run))
        .route("/coverage/runs/{id}", get(routes::coverage::get_run))
        .route("/coverage/runs/{id}/swap", patch(routes::coverage::swap))
        .route("/coverage/runs/{id}/export", post(routes::coverage::export))
        .route("/coverage/runs/{id}/download", get(routes::coverage::download_csv))
        .route("/ws", get(ws::upgrade))
        .route("/metrics", get(routes::metrics::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
