//! Curlew: a feed-card enrichment pipeline
//!
//! This crate takes an ordered batch of news-card records, resolves each
//! card's tracking redirect to its original source URL, fetches the source
//! page under global and per-host concurrency limits, and cleans the
//! extracted text before handing the records to a delivery sink.

pub mod cards;
pub mod cleaning;
pub mod config;
pub mod limiter;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod url;

use thiserror::Error;

/// Main error type for Curlew operations
#[derive(Debug, Error)]
pub enum CurlewError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Card input error: {0}")]
    Cards(#[from] cards::CardError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid environment override {name}: {message}")]
    InvalidEnv { name: String, message: String },
}

/// Result type alias for Curlew operations
pub type Result<T> = std::result::Result<T, CurlewError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cards::CardRecord;
pub use cleaning::{TextCleaner, NO_TEXT_MARKER};
pub use config::Config;
pub use limiter::HostLimiter;
pub use pipeline::{FeedItem, Orchestrator, PipelineReport};
pub use retry::RetryPolicy;
pub use crate::url::{extract_host, host_key, matches_host_pattern};
