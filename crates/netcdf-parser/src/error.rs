//! Error types for dataset reading and slicing.

use thiserror::Error;
use wps_common::GridError;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Variable carries a dimension that cannot be mapped to time, level,
    /// latitude or longitude
    #[error("Variable '{variable}' has unsupported dimension '{dimension}'")]
    UnsupportedDimension { variable: String, dimension: String },

    /// Index outside an axis
    #[error("Index {index} out of range for {axis} axis of length {len}")]
    OutOfRange {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    /// CF time axis could not be decoded
    #[error("Invalid time axis: {0}")]
    InvalidTime(String),

    /// Slice does not form a valid grid
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),

    /// Native library error
    #[error("NetCDF library error: {0}")]
    Library(String),
}

#[cfg(feature = "native")]
impl From<netcdf::Error> for NetCdfError {
    fn from(err: netcdf::Error) -> Self {
        NetCdfError::Library(err.to_string())
    }
}
