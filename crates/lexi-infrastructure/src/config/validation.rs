//! Per-concern config validators, grounded on the teacher's
//! `validate_*` dispatch pattern: one function per concern, each
//! returning [`Error::ConfigInvalid`] naming the offending key.

use lexi_domain::error::{Error, Result};

use super::AppConfig;

/// Validate every recognized option in `config`, short-circuiting on the
/// first violation.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    validate_chunking(config)?;
    validate_workers(config)?;
    validate_server(config)?;
    validate_auth(config)?;
    validate_external_services(config)?;
    Ok(())
}

fn validate_chunking(config: &AppConfig) -> Result<()> {
    if config.chunk_threshold_pages == 0 {
        return Err(config_invalid("chunk_threshold_pages", "must be greater than zero"));
    }
    if config.default_chunk_size_pages == 0 {
        return Err(config_invalid("default_chunk_size_pages", "must be greater than zero"));
    }
    if config.default_chunk_size_pages > config.chunk_threshold_pages {
        return Err(config_invalid(
            "default_chunk_size_pages",
            "must not exceed chunk_threshold_pages",
        ));
    }
    if config.overlap_window >= config.default_chunk_size_pages {
        return Err(config_invalid(
            "overlap_window",
            "must be smaller than default_chunk_size_pages",
        ));
    }
    Ok(())
}

fn validate_workers(config: &AppConfig) -> Result<()> {
    if config.max_workers == 0 {
        return Err(config_invalid("max_workers", "must be greater than zero"));
    }
    if config.task_timeout_seconds == 0 {
        return Err(config_invalid("task_timeout_seconds", "must be greater than zero"));
    }
    if config.worker_memory_limit_mb == 0 {
        return Err(config_invalid("worker_memory_limit_mb", "must be greater than zero"));
    }
    Ok(())
}

fn validate_server(config: &AppConfig) -> Result<()> {
    if config.database_url.trim().is_empty() {
        return Err(config_invalid("database_url", "must not be empty"));
    }
    if config.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(config_invalid("bind_addr", "must be a valid host:port address"));
    }
    Ok(())
}

fn validate_auth(config: &AppConfig) -> Result<()> {
    if config.auth.bearer_secret.trim().is_empty() {
        return Err(config_invalid("auth.bearer_secret", "must not be empty"));
    }
    Ok(())
}

fn validate_external_services(config: &AppConfig) -> Result<()> {
    if config.llm.base_url.trim().is_empty() {
        return Err(config_invalid("llm.base_url", "must not be empty"));
    }
    if config.export_endpoint.trim().is_empty() {
        return Err(config_invalid("export_endpoint", "must not be empty"));
    }
    Ok(())
}

fn config_invalid(key: &str, message: &str) -> Error {
    Error::ConfigInvalid {
        key: key.to_owned(),
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn overlap_window_must_be_smaller_than_chunk_size() {
        let mut config = AppConfig::default();
        config.overlap_window = config.default_chunk_size_pages;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bind_addr_must_parse() {
        let mut config = AppConfig::default();
        config.bind_addr = "not-an-address".to_owned();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bearer_secret_must_not_be_empty() {
        let mut config = AppConfig::default();
        config.auth.bearer_secret = String::new();
        assert!(validate_config(&config).is_err());
    }
}
