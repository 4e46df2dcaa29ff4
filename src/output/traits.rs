//! Record sink trait and output error types

use crate::pipeline::FeedItem;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write records: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for a finished run's record set
///
/// The pipeline's only obligation to the delivery side is the shape of each
/// record; where the records go (a file, a webhook relay, a test buffer) is
/// the sink's business.
pub trait RecordSink {
    /// Delivers the full, ordered record set of one run
    fn deliver(&self, items: &[FeedItem]) -> OutputResult<()>;
}
