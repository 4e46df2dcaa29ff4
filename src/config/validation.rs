use crate::config::types::{CleaningConfig, Config, FeedConfig, HttpConfig, PipelineConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_pipeline_config(&config.pipeline)?;
    validate_http_config(&config.http)?;
    validate_feed_config(&config.feed)?;
    validate_cleaning_config(&config.cleaning)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates concurrency and retry settings
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.resolve_concurrency < 1 || config.resolve_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "resolve_concurrency must be between 1 and 100, got {}",
            config.resolve_concurrency
        )));
    }

    if config.fetch_concurrency < 1 || config.fetch_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_concurrency must be between 1 and 100, got {}",
            config.fetch_concurrency
        )));
    }

    if config.per_host_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "per_host_concurrency must be >= 1, got {}",
            config.per_host_concurrency
        )));
    }

    if config.per_host_concurrency > config.fetch_concurrency {
        return Err(ConfigError::Validation(format!(
            "per_host_concurrency ({}) cannot exceed fetch_concurrency ({})",
            config.per_host_concurrency, config.fetch_concurrency
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.max_backoff_ms < config.base_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "max_backoff_ms ({}) must be >= base_backoff_ms ({})",
            config.max_backoff_ms, config.base_backoff_ms
        )));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_body_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_body_bytes must be >= 1024, got {}",
            config.max_body_bytes
        )));
    }

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents cannot be empty".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents entries cannot be blank".to_string(),
        ));
    }

    if config.dispatch_jitter_min_ms > config.dispatch_jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "dispatch_jitter_min_ms ({}) cannot exceed dispatch_jitter_max_ms ({})",
            config.dispatch_jitter_min_ms, config.dispatch_jitter_max_ms
        )));
    }

    Ok(())
}

/// Validates feed host rules
fn validate_feed_config(config: &FeedConfig) -> Result<(), ConfigError> {
    if !config.feed_host.is_empty() {
        validate_host_pattern(&config.feed_host)?;
    }

    if !config.referer.is_empty() {
        Url::parse(&config.referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;
    }

    for pattern in &config.blocked_hosts {
        validate_host_pattern(pattern)?;
    }

    Ok(())
}

/// Validates cleaning settings
fn validate_cleaning_config(config: &CleaningConfig) -> Result<(), ConfigError> {
    if config.max_text_lines < 1 {
        return Err(ConfigError::Validation(
            "max_text_lines must be >= 1".to_string(),
        ));
    }

    if config.max_text_chars < config.min_text_chars {
        return Err(ConfigError::Validation(format!(
            "max_text_chars ({}) must be >= min_text_chars ({})",
            config.max_text_chars, config.min_text_chars
        )));
    }

    Ok(())
}

/// Validates output settings
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a host pattern (supports wildcards)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    // Check if it's a wildcard pattern
    if let Some(host) = pattern.strip_prefix("*.") {
        validate_host_string(host)?;
    } else {
        validate_host_string(pattern)?;
    }

    Ok(())
}

/// Validates a host string (without wildcard prefix)
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host cannot be empty".to_string(),
        ));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    if !host.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' must contain at least one dot (e.g., 'example.com')",
            host
        )));
    }

    Ok(())
}
