//! Output module: the delivery boundary
//!
//! A finished run hands its record set to a [`RecordSink`]. The bundled
//! sink writes pretty-printed JSON to disk for the external uploader to
//! pick up; run statistics are printed separately.

mod json;
pub mod stats;
mod traits;

pub use json::JsonFileSink;
pub use stats::{print_statistics, PipelineStats};
pub use traits::{OutputError, OutputResult, RecordSink};
