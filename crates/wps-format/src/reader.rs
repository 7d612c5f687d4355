//! Decoding of intermediate files.
//!
//! Used by the `inspect` command and by round-trip tests. The reader is
//! strict: every record must carry matching markers and every field must
//! have the five records in the expected order.

use crate::error::{FormatError, FormatResult};
use crate::record::MARKER_LEN;
use crate::{widths, FORMAT_VERSION};

/// Iterator over the payloads of framed records in a byte buffer.
pub struct RecordReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Read the next record payload, or `None` at a clean end of stream.
    pub fn next_record(&mut self) -> FormatResult<Option<&'a [u8]>> {
        if self.is_at_end() {
            return Ok(None);
        }

        let start = self.offset;
        let leading = read_marker(self.data, start)?;
        let payload_start = start + MARKER_LEN;
        let payload_end = payload_start + leading;
        let trailing = read_marker(self.data, payload_end)?;

        if leading != trailing {
            return Err(FormatError::Framing {
                offset: start,
                reason: format!("leading marker {} != trailing marker {}", leading, trailing),
            });
        }

        self.offset = payload_end + MARKER_LEN;
        Ok(Some(&self.data[payload_start..payload_end]))
    }

    fn expect_record(&mut self, what: &str) -> FormatResult<&'a [u8]> {
        let offset = self.offset;
        self.next_record()?.ok_or_else(|| FormatError::Framing {
            offset,
            reason: format!("stream ends before {} record", what),
        })
    }
}

fn read_marker(data: &[u8], offset: usize) -> FormatResult<usize> {
    let bytes = data
        .get(offset..offset + MARKER_LEN)
        .ok_or_else(|| FormatError::Framing {
            offset,
            reason: "truncated length marker".to_string(),
        })?;
    let len = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    usize::try_from(len).map_err(|_| FormatError::Framing {
        offset,
        reason: format!("negative record length {}", len),
    })
}

/// Decoded header record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHeader {
    pub hdate: String,
    pub forecast_hours: f32,
    pub map_source: String,
    pub field: String,
    pub units: String,
    pub description: String,
    pub level: f32,
    pub nx: i32,
    pub ny: i32,
    pub projection: i32,
}

/// Decoded cylindrical equidistant geometry record.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    pub start_location: String,
    pub start_lat: f32,
    pub start_lon: f32,
    pub delta_lat: f32,
    pub delta_lon: f32,
    pub earth_radius: f32,
}

/// One complete field read back from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub version: i32,
    pub header: FieldHeader,
    pub geometry: GridGeometry,
    pub wind_earth_relative: bool,
    /// Slab values with longitude varying fastest
    pub slab: Vec<f32>,
}

impl DecodedField {
    /// Value at longitude index `i`, latitude index `j`.
    pub fn value(&self, i: usize, j: usize) -> Option<f32> {
        let nx = self.header.nx as usize;
        if i >= nx {
            return None;
        }
        self.slab.get(j * nx + i).copied()
    }
}

/// Cursor over a single record payload.
struct Fields<'a> {
    payload: &'a [u8],
    pos: usize,
    record: &'static str,
}

impl<'a> Fields<'a> {
    fn new(payload: &'a [u8], record: &'static str) -> Self {
        Self {
            payload,
            pos: 0,
            record,
        }
    }

    fn take(&mut self, n: usize) -> FormatResult<&'a [u8]> {
        let bytes = self.payload.get(self.pos..self.pos + n).ok_or_else(|| {
            FormatError::InvalidRecord(format!(
                "{} record is {} bytes, too short",
                self.record,
                self.payload.len()
            ))
        })?;
        self.pos += n;
        Ok(bytes)
    }

    fn text(&mut self, width: usize) -> FormatResult<String> {
        let bytes = self.take(width)?;
        Ok(String::from_utf8_lossy(bytes).trim_end().to_string())
    }

    fn int(&mut self) -> FormatResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn float(&mut self) -> FormatResult<f32> {
        let b = self.take(4)?;
        Ok(f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn finish(self) -> FormatResult<()> {
        if self.pos != self.payload.len() {
            return Err(FormatError::InvalidRecord(format!(
                "{} record has {} trailing bytes",
                self.record,
                self.payload.len() - self.pos
            )));
        }
        Ok(())
    }
}

fn read_one_field(reader: &mut RecordReader<'_>) -> FormatResult<DecodedField> {
    let mut ifv = Fields::new(reader.expect_record("version")?, "version");
    let version = ifv.int()?;
    ifv.finish()?;
    if version != FORMAT_VERSION {
        return Err(FormatError::InvalidRecord(format!(
            "unsupported format version {}",
            version
        )));
    }

    let mut h = Fields::new(reader.expect_record("header")?, "header");
    let header = FieldHeader {
        hdate: h.text(widths::HDATE)?,
        forecast_hours: h.float()?,
        map_source: h.text(widths::MAP_SOURCE)?,
        field: h.text(widths::FIELD)?,
        units: h.text(widths::UNITS)?,
        description: h.text(widths::DESC)?,
        level: h.float()?,
        nx: h.int()?,
        ny: h.int()?,
        projection: h.int()?,
    };
    h.finish()?;

    let mut g = Fields::new(reader.expect_record("geometry")?, "geometry");
    let geometry = GridGeometry {
        start_location: g.text(widths::START_LOCATION)?,
        start_lat: g.float()?,
        start_lon: g.float()?,
        delta_lat: g.float()?,
        delta_lon: g.float()?,
        earth_radius: g.float()?,
    };
    g.finish()?;

    let mut w = Fields::new(reader.expect_record("wind flag")?, "wind flag");
    let wind_earth_relative = w.int()? != 0;
    w.finish()?;

    let slab_payload = reader.expect_record("slab")?;
    let expected = (header.nx.max(0) as usize) * (header.ny.max(0) as usize) * 4;
    if slab_payload.len() != expected {
        return Err(FormatError::InvalidRecord(format!(
            "slab is {} bytes but {} x {} grid needs {}",
            slab_payload.len(),
            header.nx,
            header.ny,
            expected
        )));
    }
    let slab = slab_payload
        .chunks_exact(4)
        .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(DecodedField {
        version,
        header,
        geometry,
        wind_earth_relative,
        slab,
    })
}

/// Decode every field in an intermediate file's contents.
pub fn read_fields(data: &[u8]) -> FormatResult<Vec<DecodedField>> {
    let mut reader = RecordReader::new(data);
    let mut fields = Vec::new();
    while !reader.is_at_end() {
        fields.push(read_one_field(&mut reader)?);
    }
    Ok(fields)
}
