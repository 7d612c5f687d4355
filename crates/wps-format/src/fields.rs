//! Typed field serialization for record payloads.
//!
//! Fields are packed back to back with no delimiters. Text is ASCII,
//! left-justified and space padded to its declared width; longer text is
//! silently cut at the width. Numbers are big-endian 4-byte values.

use std::io::Write;

use bytes::{BufMut, BytesMut};

use crate::error::{FormatError, FormatResult};
use crate::record::{frame_record, write_record};

/// Pad or truncate `value` to exactly `width` ASCII bytes.
///
/// Truncation happens before the ASCII check, so characters beyond the
/// width never cause an error.
pub fn pad_text(field: &'static str, value: &str, width: usize) -> FormatResult<Vec<u8>> {
    let kept: String = value.chars().take(width).collect();
    if !kept.is_ascii() {
        return Err(FormatError::NonAscii {
            field,
            value: value.to_string(),
        });
    }

    let mut bytes = kept.into_bytes();
    bytes.resize(width, b' ');
    Ok(bytes)
}

/// Builds one record payload field by field.
///
/// ```
/// use wps_format::FieldEncoder;
///
/// let mut enc = FieldEncoder::new();
/// enc.text("FIELD", "TT", 9).unwrap().float(0.0).int(5);
/// assert_eq!(enc.len(), 17);
/// ```
#[derive(Debug, Default)]
pub struct FieldEncoder {
    buf: BytesMut,
}

impl FieldEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Fixed-width text field.
    pub fn text(&mut self, field: &'static str, value: &str, width: usize) -> FormatResult<&mut Self> {
        let padded = pad_text(field, value, width)?;
        self.buf.put_slice(&padded);
        Ok(self)
    }

    /// 4-byte big-endian signed integer.
    pub fn int(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32(value);
        self
    }

    /// 4-byte big-endian IEEE-754 float.
    pub fn float(&mut self, value: f32) -> &mut Self {
        self.buf.put_f32(value);
        self
    }

    /// A run of big-endian floats.
    pub fn floats<I: IntoIterator<Item = f32>>(&mut self, values: I) -> &mut Self {
        for v in values {
            self.buf.put_f32(v);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Frame the payload as one record and append it to `out`.
    pub fn frame_into(&self, out: &mut BytesMut) -> FormatResult<()> {
        frame_record(out, &self.buf)
    }

    /// Frame the payload as one record and write it to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> FormatResult<()> {
        write_record(writer, &self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_short_text() {
        assert_eq!(pad_text("FIELD", "TT", 9).unwrap(), b"TT       ".to_vec());
    }

    #[test]
    fn test_truncate_long_text() {
        let padded = pad_text("FIELD", "SOILHGT_LONG", 9).unwrap();
        assert_eq!(padded, b"SOILHGT_L".to_vec());
    }

    #[test]
    fn test_exact_width_untouched() {
        assert_eq!(pad_text("STARTLOC", "SWCORNER", 8).unwrap(), b"SWCORNER".to_vec());
    }

    #[test]
    fn test_non_ascii_rejected() {
        match pad_text("UNITS", "°C", 25) {
            Err(FormatError::NonAscii { field, .. }) => assert_eq!(field, "UNITS"),
            other => panic!("Expected NonAscii, got {:?}", other),
        }
    }

    #[test]
    fn test_non_ascii_beyond_width_is_cut_first() {
        assert_eq!(pad_text("UNITS", "K°", 1).unwrap(), b"K".to_vec());
    }

    #[test]
    fn test_numeric_fields_big_endian() {
        let mut enc = FieldEncoder::new();
        enc.int(5).float(1.5).int(-1);
        assert_eq!(
            enc.as_bytes(),
            &[0, 0, 0, 5, 0x3F, 0xC0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_frame_into_wraps_payload() {
        let mut enc = FieldEncoder::new();
        enc.text("FIELD", "PMSL", 9).unwrap().float(0.0);

        let mut out = BytesMut::new();
        enc.frame_into(&mut out).unwrap();
        assert_eq!(out.len(), 13 + 8);
        assert_eq!(&out[0..4], &13i32.to_be_bytes());
        assert_eq!(&out[4..13], b"PMSL     ");
        assert_eq!(&out[17..21], &13i32.to_be_bytes());
    }
}
