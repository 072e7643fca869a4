//! Output sink trait and errors

use crate::state::ProductRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Append-only destination for finished records
///
/// Records arrive in completion order, each exactly once.
pub trait RecordSink: Send {
    /// Appends one record
    fn write_record(&mut self, record: &ProductRecord) -> OutputResult<()>;

    /// Flushes anything buffered
    fn flush(&mut self) -> OutputResult<()>;
}
