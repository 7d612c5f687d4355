//! Common types shared across the WPS intermediate converter crates.

pub mod error;
pub mod grid;
pub mod time;

pub use error::{GridError, GridResult};
pub use grid::{GeoGrid, GridSpacing};
pub use time::{parse_datetime, parse_interval, truncate_to_hour, TimeParseError, TimeWindow};
