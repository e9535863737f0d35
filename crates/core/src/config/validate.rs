use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - remote.base_url is a non-empty http(s) URL
/// - remote.timeout_secs and remote.max_pages are not 0
/// - query.top_n is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.remote.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "remote.base_url cannot be empty".to_string(),
        ));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "remote.base_url must start with http:// or https://, got {}",
            base_url
        )));
    }

    if config.remote.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "remote.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.remote.max_pages == 0 {
        return Err(ConfigError::ValidationError(
            "remote.max_pages cannot be 0".to_string(),
        ));
    }

    if config.query.top_n == 0 {
        return Err(ConfigError::ValidationError(
            "query.top_n cannot be 0".to_string(),
        ));
    }

    Ok(())
}
