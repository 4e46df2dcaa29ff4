use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied after parsing, then the result is
/// validated.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config)?;
    validate(&config)?;

    Ok(config)
}

/// Builds the default configuration with environment overrides applied
///
/// Used when no configuration file is given on the command line.
pub fn default_config() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run's output can be tied to the exact
/// configuration that produced it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies `CURLEW_*` environment overrides to a parsed configuration
///
/// Recognized variables:
/// - `CURLEW_RESOLVE_CONCURRENCY`
/// - `CURLEW_FETCH_CONCURRENCY`
/// - `CURLEW_PER_HOST_CONCURRENCY`
/// - `CURLEW_MAX_ATTEMPTS`
/// - `CURLEW_BASE_BACKOFF_MS`
///
/// Unset variables leave the file (or default) value in place; set but
/// unparseable values are an error rather than a silent fallback.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Some(value) = env_override("CURLEW_RESOLVE_CONCURRENCY")? {
        config.pipeline.resolve_concurrency = value;
    }
    if let Some(value) = env_override("CURLEW_FETCH_CONCURRENCY")? {
        config.pipeline.fetch_concurrency = value;
    }
    if let Some(value) = env_override("CURLEW_PER_HOST_CONCURRENCY")? {
        config.pipeline.per_host_concurrency = value;
    }
    if let Some(value) = env_override("CURLEW_MAX_ATTEMPTS")? {
        config.pipeline.max_attempts = value;
    }
    if let Some(value) = env_override("CURLEW_BASE_BACKOFF_MS")? {
        config.pipeline.base_backoff_ms = value;
    }
    Ok(())
}

/// Reads and parses one environment override
fn env_override<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnv {
                name: name.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
