//! Error types for encoding and decoding intermediate files.

use thiserror::Error;
use wps_common::GridError;

/// Result type for format operations.
pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Error, Debug)]
pub enum FormatError {
    /// Underlying sink or source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text field contains characters that cannot be written as ASCII
    #[error("Field {field} is not ASCII: {value:?}")]
    NonAscii { field: &'static str, value: String },

    /// Payload does not fit a 4-byte record marker
    #[error("Record payload of {0} bytes exceeds the 4-byte length marker")]
    RecordTooLarge(usize),

    /// Grid geometry cannot be described by a single start/delta pair
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),

    /// Leading and trailing markers disagree or the stream ends mid-record
    #[error("Malformed record at byte {offset}: {reason}")]
    Framing { offset: usize, reason: String },

    /// Record decoded but its content is not what the format expects
    #[error("Unexpected record content: {0}")]
    InvalidRecord(String),
}
