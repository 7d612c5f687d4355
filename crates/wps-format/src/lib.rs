//! WPS intermediate format encoder (version 5).
//!
//! The WRF Preprocessing System reads meteorological fields from
//! "intermediate" files: sequences of Fortran unformatted records, each
//! framed by a big-endian byte count before and after the payload. One
//! field occupies five consecutive records:
//!
//! 1. `IFV` - format version (always 5)
//! 2. header - date, forecast lead, source, field name, units, description,
//!    level, grid dimensions and projection code
//! 3. grid geometry - corner label, start lat/lon, deltas, Earth radius
//! 4. `IS_WIND_EARTH_REL` flag
//! 5. the data slab, `NX * NY` big-endian `f32` with longitude varying fastest
//!
//! Only the cylindrical equidistant (plain lat/lon) projection is produced.

pub mod error;
pub mod fields;
pub mod reader;
pub mod record;
pub mod slab;

pub use error::{FormatError, FormatResult};
pub use fields::FieldEncoder;
pub use reader::{read_fields, DecodedField, FieldHeader, GridGeometry, RecordReader};
pub use record::{frame_record, write_record};
pub use slab::{encode_slab, format_hdate, write_slab, FieldMetadata};

/// Format version tag written as the first record of every field.
pub const FORMAT_VERSION: i32 = 5;

/// Earth radius in kilometres written to the geometry record.
pub const EARTH_RADIUS_KM: f32 = 6367.470;

/// Projection code for a cylindrical equidistant (lat/lon) grid.
pub const PROJECTION_LATLON: i32 = 0;

/// Corner the start coordinates refer to.
pub const START_LOCATION: &str = "SWCORNER";

/// `XLVL` value that marks a surface field rather than a pressure level.
pub const SURFACE_LEVEL: f32 = 200100.0;

/// Fixed widths of the text fields, in bytes.
pub mod widths {
    pub const HDATE: usize = 24;
    pub const MAP_SOURCE: usize = 32;
    pub const FIELD: usize = 9;
    pub const UNITS: usize = 25;
    pub const DESC: usize = 46;
    pub const START_LOCATION: usize = 8;
}
