//! Fortran unformatted record framing.
//!
//! Each record is `[len: i32 BE][payload][len: i32 BE]`. The payload is
//! copied verbatim.

use std::io::Write;

use bytes::{BufMut, BytesMut};

use crate::error::{FormatError, FormatResult};

/// Size of one length marker.
pub const MARKER_LEN: usize = 4;

fn marker(payload: &[u8]) -> FormatResult<i32> {
    i32::try_from(payload.len()).map_err(|_| FormatError::RecordTooLarge(payload.len()))
}

/// Append a framed record to `buf`.
pub fn frame_record(buf: &mut BytesMut, payload: &[u8]) -> FormatResult<()> {
    let len = marker(payload)?;
    buf.reserve(payload.len() + 2 * MARKER_LEN);
    buf.put_i32(len);
    buf.put_slice(payload);
    buf.put_i32(len);
    Ok(())
}

/// Write a framed record directly to `writer`.
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> FormatResult<()> {
    let len = marker(payload)?.to_be_bytes();
    writer.write_all(&len)?;
    writer.write_all(payload)?;
    writer.write_all(&len)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_record_layout() {
        let mut buf = BytesMut::new();
        frame_record(&mut buf, b"abc").unwrap();
        assert_eq!(
            &buf[..],
            &[0, 0, 0, 3, b'a', b'b', b'c', 0, 0, 0, 3]
        );
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        frame_record(&mut buf, &[]).unwrap();
        assert_eq!(&buf[..], &[0u8; 8]);
    }

    #[test]
    fn test_write_record_matches_frame_record() {
        let payload: Vec<u8> = (0..=255).collect();
        let mut framed = BytesMut::new();
        frame_record(&mut framed, &payload).unwrap();

        let mut written = Vec::new();
        write_record(&mut written, &payload).unwrap();

        assert_eq!(&framed[..], &written[..]);
        assert_eq!(&written[0..4], &256i32.to_be_bytes());
        assert_eq!(&written[260..264], &256i32.to_be_bytes());
    }

    #[test]
    fn test_write_error_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        match write_record(&mut Broken, b"x") {
            Err(FormatError::Io(e)) => assert_eq!(e.to_string(), "disk full"),
            other => panic!("Expected I/O error, got {:?}", other),
        }
    }
}
