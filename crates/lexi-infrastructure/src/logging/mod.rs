//! `tracing` subscriber initialization (ambient stack, spec.md §7.2).

use std::fs::File;

use lexi_domain::error::{Error, Result};
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Initialize the global `tracing` subscriber: `RUST_LOG`-driven if set,
/// else `config.log_level`. Writes compact ANSI output to stdout unless
/// `config.log_file` names a path, in which case output is structured
/// JSON written there instead.
pub fn init_logging(config: &AppConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("lexi={}", config.log_level)))
        .map_err(|e| Error::config(format!("invalid log_level '{}': {e}", config.log_level)))?;

    if let Some(log_path) = &config.log_file {
        init_file_logging(log_path, env_filter)
    } else {
        init_stdout_logging(env_filter);
        Ok(())
    }
}

fn init_stdout_logging(env_filter: EnvFilter) {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn init_file_logging(log_path: &std::path::Path, env_filter: EnvFilter) -> Result<()> {
    let file = File::create(log_path)
        .map_err(|e| Error::infrastructure_with_source("failed to create log file", e))?;

    let fmt_layer = fmt::layer()
        .with_writer(file)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
    Ok(())
}

/// Initialize a test-scoped subscriber exactly once per process.
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lexi=debug"));
        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok();
    });
}
