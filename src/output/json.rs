//! JSON file sink

use crate::output::traits::{OutputResult, RecordSink};
use crate::pipeline::FeedItem;
use std::fs;
use std::path::PathBuf;

/// Writes the record set as pretty-printed JSON to a file
///
/// Parent directories are created as needed; an existing file is replaced.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Creates a sink writing to the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSink for JsonFileSink {
    fn deliver(&self, items: &[FeedItem]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, json)?;

        tracing::info!("Wrote {} records to {}", items.len(), self.path.display());
        Ok(())
    }
}
