//! Wire-level primitives: 4-byte-aligned reads and writes.
//!
//! Everything on an OSC wire is big-endian and padded so that each field
//! starts and ends on a 4-byte boundary. [`WireWriter`] appends fields to a
//! growable buffer; [`WireReader`] walks a received datagram, validating
//! alignment and length as it goes.

use crate::{ProtocolError, TimeTag};

/// Number of pad bytes that follow `len` payload bytes in a blob (0–3).
pub(crate) fn blob_padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Appends OSC wire fields to an owned buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a big-endian `i32`.
    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Writes a big-endian IEEE-754 `f32`.
    pub fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Writes a string followed by 1–4 NUL bytes, so the field is
    /// NUL-terminated and a multiple of 4 bytes long.
    pub fn put_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        let pad = 4 - s.len() % 4;
        self.buf.extend(std::iter::repeat(0u8).take(pad));
    }

    /// Writes a blob: big-endian `i32` length, payload, 0–3 pad NULs.
    ///
    /// An empty slice is a valid blob with a zero length prefix.
    pub fn put_blob(&mut self, data: &[u8]) {
        self.put_i32(data.len() as i32);
        self.buf.extend_from_slice(data);
        let pad = blob_padding(data.len());
        self.buf.extend(std::iter::repeat(0u8).take(pad));
    }

    /// Writes a time-tag as two big-endian 32-bit words.
    pub fn put_time_tag(&mut self, t: TimeTag) {
        self.buf.extend_from_slice(&t.seconds.to_be_bytes());
        self.buf.extend_from_slice(&t.fraction.to_be_bytes());
    }

    /// Appends raw bytes without padding. The caller is responsible for
    /// keeping the buffer aligned.
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A cursor over a received datagram.
#[derive(Debug)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over `data`, positioned at the start.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::Truncated {
                needed: n - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads a big-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes(bytes.try_into().expect("4-byte slice")))
    }

    /// Reads a big-endian IEEE-754 `f32`.
    pub fn read_f32(&mut self) -> Result<f32, ProtocolError> {
        let bytes = self.take(4)?;
        Ok(f32::from_be_bytes(bytes.try_into().expect("4-byte slice")))
    }

    /// Reads an aligned string: scans to the first NUL, then consumes pad
    /// NULs up to the next 4-byte boundary.
    pub fn read_str(&mut self) -> Result<String, ProtocolError> {
        let start = self.pos;
        let rest = &self.data[start..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ProtocolError::Truncated { needed: 1 })?;
        let value = String::from_utf8(rest[..nul].to_vec())?;

        // Consumed length includes the terminator plus padding to a
        // multiple of 4 bytes from the start of the field.
        let mut consumed = nul + 1;
        while consumed % 4 != 0 {
            consumed += 1;
        }
        if rest.len() < consumed {
            return Err(ProtocolError::Truncated {
                needed: consumed - rest.len(),
            });
        }
        self.pos = start + consumed;
        Ok(value)
    }

    /// Reads a blob: length prefix, payload, pad NULs.
    pub fn read_blob(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(ProtocolError::NegativeBlobLength(len));
        }
        let len = len as usize;
        let payload = self.take(len)?.to_vec();
        self.take(blob_padding(len))?;
        Ok(payload)
    }

    /// Reads a time-tag as two big-endian 32-bit words.
    pub fn read_time_tag(&mut self) -> Result<TimeTag, ProtocolError> {
        let bytes = self.take(8)?;
        Ok(TimeTag {
            seconds: u32::from_be_bytes(bytes[..4].try_into().expect("4-byte slice")),
            fraction: u32::from_be_bytes(bytes[4..].try_into().expect("4-byte slice")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_padding_always_terminates() {
        for s in ["", "a", "ab", "abc", "abcd", "abcde"] {
            let mut w = WireWriter::new();
            w.put_str(s);
            let bytes = w.into_bytes();
            assert_eq!(bytes.len() % 4, 0, "unaligned encoding of {s:?}");
            assert!(bytes.len() > s.len(), "missing terminator for {s:?}");
            assert_eq!(&bytes[..s.len()], s.as_bytes());
            assert!(bytes[s.len()..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn string_round_trip() {
        let mut w = WireWriter::new();
        w.put_str("/foo/bar");
        w.put_str("x");
        let bytes = w.into_bytes();

        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_str().unwrap(), "/foo/bar");
        assert_eq!(r.read_str().unwrap(), "x");
        assert!(r.is_empty());
    }

    #[test]
    fn blob_of_three_bytes_occupies_eight() {
        let mut w = WireWriter::new();
        w.put_blob(&[1, 2, 3]);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &3i32.to_be_bytes());
        assert_eq!(&bytes[4..7], &[1, 2, 3]);
        assert_eq!(bytes[7], 0);
    }

    #[test]
    fn empty_blob_is_just_the_length_prefix() {
        let mut w = WireWriter::new();
        w.put_blob(&[]);
        let bytes = w.into_bytes();
        assert_eq!(bytes, 0i32.to_be_bytes());

        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_blob().unwrap(), Vec::<u8>::new());
        assert!(r.is_empty());
    }

    #[test]
    fn i32_and_f32_are_big_endian() {
        let mut w = WireWriter::new();
        w.put_i32(1122);
        w.put_f32(1.5);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..4], &[0x00, 0x00, 0x04, 0x62]);

        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_i32().unwrap(), 1122);
        assert_eq!(r.read_f32().unwrap(), 1.5);
    }

    #[test]
    fn truncated_reads_report_missing_bytes() {
        let mut r = WireReader::new(&[0, 0]);
        match r.read_i32() {
            Err(ProtocolError::Truncated { needed }) => assert_eq!(needed, 2),
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_string_is_truncated() {
        let mut r = WireReader::new(b"abcd");
        assert!(matches!(
            r.read_str(),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn time_tag_round_trip() {
        let t = TimeTag {
            seconds: 3_913_000_000,
            fraction: 0x8000_0000,
        };
        let mut w = WireWriter::new();
        w.put_time_tag(t);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 8);

        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_time_tag().unwrap(), t);
    }
}
