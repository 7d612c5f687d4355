//! Conversion of gridded climate model output into WPS intermediate files.
//!
//! # Architecture
//!
//! - [`config`]: the variable mapping table (source variable to WPS field)
//! - [`fill`]: gap filling by linear interpolation along latitude then
//!   longitude
//! - [`pipeline`]: per-dataset time selection, units checks and the
//!   time x level fan-out into encoded fields
//! - [`converter`]: multi-file driver that owns the output sinks for a run

pub mod config;
pub mod converter;
pub mod error;
pub mod fill;
pub mod pipeline;

// Re-exports
pub use config::{MappingTable, VariableMapping};
pub use converter::{ConversionSummary, ConvertOptions, Converter};
pub use error::{ConversionError, Result};
pub use fill::{fill_line, fill_missing};
pub use pipeline::{ConversionPipeline, ConversionRequest, DatasetOutcome, DEFAULT_MAP_SOURCE};
