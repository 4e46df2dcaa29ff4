//! Configuration module for Curlew
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every section is optional: an empty file (or no file at all)
//! yields the built-in defaults. The concurrency and retry knobs can also be
//! overridden through `CURLEW_*` environment variables, which take
//! precedence over the file.
//!
//! # Example
//!
//! ```no_run
//! use curlew::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("curlew.toml")).unwrap();
//! println!("Fetch concurrency: {}", config.pipeline.fetch_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CleaningConfig, Config, FeedConfig, HttpConfig, OutputConfig, PipelineConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, default_config, load_config, load_config_with_hash,
};
