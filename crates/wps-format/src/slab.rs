//! Encoding of one complete field (five records).

use std::io::Write;

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use tracing::trace;
use wps_common::GeoGrid;

use crate::error::{FormatError, FormatResult};
use crate::fields::FieldEncoder;
use crate::record::MARKER_LEN;
use crate::{
    widths, EARTH_RADIUS_KM, FORMAT_VERSION, PROJECTION_LATLON, START_LOCATION,
};

/// Header size: 24s f 32s 9s 25s 46s f i i i
const HEADER_LEN: usize =
    widths::HDATE + 4 + widths::MAP_SOURCE + widths::FIELD + widths::UNITS + widths::DESC + 4 * 4;

/// Geometry size: 8s 5f
const GEOMETRY_LEN: usize = widths::START_LOCATION + 5 * 4;

/// Descriptive metadata for one field-slab.
///
/// Forecast lead, projection, corner convention, Earth radius and the wind
/// rotation flag are fixed by the format and not part of this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    /// Valid time; only the hour is written
    pub valid_time: DateTime<Utc>,
    /// Source label (`MAP_SOURCE`), e.g. "CMIP6"
    pub map_source: String,
    /// Field name as WPS knows it, e.g. "TT" (at most 9 characters)
    pub field: String,
    pub units: String,
    pub description: String,
    /// Pressure in Pa, or [`crate::SURFACE_LEVEL`]
    pub level: f32,
}

/// `HDATE` string: valid time truncated to the hour.
pub fn format_hdate(valid_time: &DateTime<Utc>) -> String {
    valid_time.format("%Y-%m-%d_%H:00:00").to_string()
}

fn dimension(name: &str, len: usize) -> FormatResult<i32> {
    i32::try_from(len).map_err(|_| {
        FormatError::InvalidRecord(format!("{} = {} does not fit a 4-byte integer", name, len))
    })
}

/// Encode the five records of one field into a single buffer.
///
/// The grid must be regular: its spacing is validated before anything is
/// encoded, so an irregular grid produces no bytes at all.
pub fn encode_slab(grid: &GeoGrid, meta: &FieldMetadata) -> FormatResult<BytesMut> {
    let spacing = grid.spacing()?;
    let nx = dimension("NX", grid.nx())?;
    let ny = dimension("NY", grid.ny())?;
    let slab_len = grid.values().len() * 4;

    let mut out = BytesMut::with_capacity(
        4 + HEADER_LEN + GEOMETRY_LEN + 4 + slab_len + 5 * 2 * MARKER_LEN,
    );

    // IFV
    let mut version = FieldEncoder::with_capacity(4);
    version.int(FORMAT_VERSION);
    version.frame_into(&mut out)?;

    // HDATE, XFCST, MAP_SOURCE, FIELD, UNITS, DESC, XLVL, NX, NY, IPROJ
    let mut header = FieldEncoder::with_capacity(HEADER_LEN);
    header
        .text("HDATE", &format_hdate(&meta.valid_time), widths::HDATE)?
        .float(0.0)
        .text("MAP_SOURCE", &meta.map_source, widths::MAP_SOURCE)?
        .text("FIELD", &meta.field, widths::FIELD)?
        .text("UNITS", &meta.units, widths::UNITS)?
        .text("DESC", &meta.description, widths::DESC)?
        .float(meta.level)
        .int(nx)
        .int(ny)
        .int(PROJECTION_LATLON);
    header.frame_into(&mut out)?;

    // STARTLOC, STARTLAT, STARTLON, DELTALAT, DELTALON, EARTH_RADIUS
    let mut geometry = FieldEncoder::with_capacity(GEOMETRY_LEN);
    geometry
        .text("STARTLOC", START_LOCATION, widths::START_LOCATION)?
        .float(spacing.start_lat as f32)
        .float(spacing.start_lon as f32)
        .float(spacing.delta_lat as f32)
        .float(spacing.delta_lon as f32)
        .float(EARTH_RADIUS_KM);
    geometry.frame_into(&mut out)?;

    // IS_WIND_EARTH_REL
    let mut wind = FieldEncoder::with_capacity(4);
    wind.int(0);
    wind.frame_into(&mut out)?;

    // SLAB
    let mut slab = FieldEncoder::with_capacity(slab_len);
    slab.floats(grid.iter_lon_fastest());
    slab.frame_into(&mut out)?;

    trace!(
        field = %meta.field,
        level = meta.level,
        nx = nx,
        ny = ny,
        bytes = out.len(),
        "Encoded field slab"
    );

    Ok(out)
}

/// Encode one field and write it to `writer` in a single call, so a
/// failure while encoding leaves nothing behind in the sink.
///
/// Returns the number of bytes written.
pub fn write_slab<W: Write>(writer: &mut W, grid: &GeoGrid, meta: &FieldMetadata) -> FormatResult<usize> {
    let encoded = encode_slab(grid, meta)?;
    writer.write_all(&encoded)?;
    Ok(encoded.len())
}
