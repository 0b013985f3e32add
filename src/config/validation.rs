use crate::config::types::{Config, CrawlerConfig, ImageConfig, OutputConfig, StructuringConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_image_config(&config.images)?;
    validate_output_config(&config.output)?;
    validate_structuring_config(&config.structuring)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_cap < 1 {
        return Err(ConfigError::Validation(format!(
            "page_cap must be >= 1, got {}",
            config.page_cap
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 120, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates image pipeline configuration
fn validate_image_config(config: &ImageConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "images.concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "images.max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "images.max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.render_fallback && config.browser_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "images.browser_path is required when render_fallback is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_root.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "data_root cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates structuring service configuration
fn validate_structuring_config(config: &StructuringConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid structuring endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Structuring endpoint '{}' must use HTTP or HTTPS",
            config.endpoint
        )));
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "structuring.model cannot be empty".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "structuring.temperature must be between 0 and 2, got {}",
            config.temperature
        )));
    }

    Ok(())
}
