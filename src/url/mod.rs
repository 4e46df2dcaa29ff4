//! URL handling for the enrichment pipeline
//!
//! This module derives the per-host throttling key from resolved URLs and
//! matches hosts against configured patterns (feed host, blocked hosts).

mod host;
mod matcher;

// Re-export main functions
pub use host::{extract_host, host_key};
pub use matcher::matches_host_pattern;

/// Checks a host against a list of patterns
///
/// Returns true if any pattern in the list matches the host. Patterns use
/// the same syntax as [`matches_host_pattern`].
pub fn matches_any_pattern(patterns: &[String], host: &str) -> bool {
    patterns.iter().any(|p| matches_host_pattern(p, host))
}
