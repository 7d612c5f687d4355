//! Error types for grid handling.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while building or validating a geographic grid.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("{axis} axis needs at least 2 points to define a spacing, got {len}")]
    DegenerateAxis { axis: &'static str, len: usize },

    #[error("{axis} axis is not strictly ascending at index {index}")]
    NotAscending { axis: &'static str, index: usize },

    #[error(
        "{axis} axis spacing is irregular at index {index}: expected {expected}, found {found}"
    )]
    Irregular {
        axis: &'static str,
        index: usize,
        expected: f64,
        found: f64,
    },

    #[error("Grid shape mismatch: {nx} x {ny} grid needs {expected} values, got {got}")]
    ShapeMismatch {
        nx: usize,
        ny: usize,
        expected: usize,
        got: usize,
    },
}
