//! Concrete [`LlmClient`] adapters (C3's external collaborator).

mod http_client;

pub use http_client::{HttpLlmClient, HttpLlmConfig};
