//! Error types for the conversion crate.

use chrono::{DateTime, Utc};
use thiserror::Error;

use netcdf_parser::NetCdfError;
use storage::StorageError;
use wps_common::{GridError, TimeParseError};
use wps_format::FormatError;

/// Errors that can occur during conversion.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Units mismatch for variable {variable}: data has '{found}' but expected '{expected}'")]
    UnitsMismatch {
        variable: String,
        found: String,
        expected: String,
    },

    #[error("Irregular grid: {0}")]
    IrregularGrid(#[from] GridError),

    #[error("Dataset {dataset} has no time step {time}")]
    MissingTimeStep {
        dataset: String,
        time: DateTime<Utc>,
    },

    #[error("Variable {variable} has no '{attribute}' attribute")]
    MissingAttribute {
        variable: String,
        attribute: &'static str,
    },

    #[error("{missing} values of {variable} could not be filled by interpolation")]
    UnfillableValues { variable: String, missing: usize },

    #[error("Invalid variable mapping: {0}")]
    InvalidMapping(String),

    #[error("Invalid time request: {0}")]
    Time(#[from] TimeParseError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] NetCdfError),

    #[error("Encoding error: {0}")]
    Format(#[from] FormatError),

    #[error("Output error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Whether the error must abort the whole run, even when the caller
    /// asked to continue past failing datasets.
    ///
    /// Wrong physical units and output failures are never tolerated.
    pub fn is_fatal(&self) -> bool {
        match self {
            ConversionError::UnitsMismatch { .. }
            | ConversionError::Storage(_)
            | ConversionError::InvalidMapping(_)
            | ConversionError::Time(_) => true,
            ConversionError::Format(FormatError::Io(_)) => true,
            _ => false,
        }
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConversionError>;
