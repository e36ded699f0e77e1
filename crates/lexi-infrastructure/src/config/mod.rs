//! Configuration loading and validation (spec.md §6, §7.3 recognized
//! options).

mod validation;

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use lexi_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub use validation::validate_config;

/// Bearer-token auth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used by the bundled [`lexi_providers`] token verifier.
    pub bearer_secret: String,
}

/// Settings for the bundled OpenAI-compatible LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the chat-completions endpoint.
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Model name for the speed tier.
    pub speed_model: String,
    /// Model name for the balanced tier.
    pub balanced_model: String,
    /// Model name for the quality tier.
    pub quality_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1/chat/completions".to_owned(),
            api_key: String::new(),
            speed_model: "gpt-4o-mini".to_owned(),
            balanced_model: "gpt-4o".to_owned(),
            quality_model: "gpt-4o".to_owned(),
        }
    }
}

/// Fully-resolved application configuration: every setting listed in
/// spec.md §6 `ProcessingSettings`/`allow_local_fallback` defaults plus
/// the ambient server/database/logging/auth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pages above which a PDF is split into multiple Chunks.
    pub chunk_threshold_pages: u32,
    /// Default pages per Chunk when chunking is required.
    pub default_chunk_size_pages: u32,
    /// Pages of overlap between adjacent Chunks.
    pub overlap_window: u32,
    /// Maximum concurrent chunk-processing workers.
    pub max_workers: u32,
    /// Per-task timeout, in seconds, before the watchdog reaps it.
    pub task_timeout_seconds: u64,
    /// Soft memory budget per worker, in megabytes.
    pub worker_memory_limit_mb: u64,
    /// Default for `ProcessingSettings::fold_diacritics`.
    pub fold_diacritics: bool,
    /// Default for `ProcessingSettings::allow_local_fallback`.
    pub allow_local_fallback: bool,

    /// SQLite connection string.
    pub database_url: String,
    /// HTTP/WebSocket bind address, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// `tracing` filter directive, e.g. `info` or `lexi=debug`.
    pub log_level: String,
    /// Optional path to a JSON log file; stdout (compact, ANSI) otherwise.
    pub log_file: Option<PathBuf>,

    /// Bearer-token auth settings.
    pub auth: AuthConfig,
    /// LLM provider settings.
    pub llm: LlmConfig,
    /// External spreadsheet export service endpoint.
    pub export_endpoint: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chunk_threshold_pages: 50,
            default_chunk_size_pages: 20,
            overlap_window: 8,
            max_workers: 4,
            task_timeout_seconds: 300,
            worker_memory_limit_mb: 512,
            fold_diacritics: true,
            allow_local_fallback: true,
            database_url: "sqlite://lexi.db".to_owned(),
            bind_addr: "0.0.0.0:8080".to_owned(),
            log_level: "info".to_owned(),
            log_file: None,
            auth: AuthConfig {
                bearer_secret: "change-me".to_owned(),
            },
            llm: LlmConfig::default(),
            export_endpoint: "https://export.example.invalid/sentences".to_owned(),
        }
    }
}

/// Load configuration: explicit `path` if given, else `LEXI_CONFIG`, else
/// a `lexi.toml` found by walking up from the current directory, else
/// built-in defaults. `LEXI_`-prefixed environment variables always
/// override whatever file was found (spec.md §7.3).
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(figment::providers::Serialized::defaults(AppConfig::default()));

    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    } else if let Ok(env_path) = std::env::var("LEXI_CONFIG") {
        figment = figment.merge(Toml::file(env_path));
    } else if let Some(found) = find_ancestor_config() {
        figment = figment.merge(Toml::file(found));
    }

    figment = figment.merge(Env::prefixed("LEXI_").split("__"));

    let config: AppConfig = figment
        .extract()
        .map_err(|e| Error::config(format!("failed to load configuration: {e}")))?;
    validate_config(&config)?;
    Ok(config)
}

fn find_ancestor_config() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join("lexi.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
