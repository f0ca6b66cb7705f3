//! Bounds-checked wire codec
//!
//! The proxy reads each control message as a single buffer and parses it
//! in place. `WireReader` is a cursor over such a buffer: every read is
//! bounds-checked and a short buffer fails with [`SocksError::Truncated`]
//! without ever handing back partial data. `WireWriter` is the encoding
//! side; it cannot fail for well-typed input. All fields are network
//! byte order.

use crate::error::SocksError;
use bytes::{BufMut, BytesMut};

/// Cursor over a received buffer.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn check(&self, needed: usize) -> Result<(), SocksError> {
        if self.remaining() < needed {
            return Err(SocksError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read one unsigned byte.
    pub fn get_u8(&mut self) -> Result<u8, SocksError> {
        self.check(1)?;
        let value = self.buf[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Read an unsigned 16-bit value in network byte order.
    pub fn get_u16(&mut self) -> Result<u16, SocksError> {
        self.check(2)?;
        let value = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    /// Read a raw byte run of caller-supplied length.
    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], SocksError> {
        self.check(len)?;
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Consume and return everything left in the buffer.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }
}

/// Growable encoder for outbound messages.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        WireWriter {
            buf: BytesMut::new(),
        }
    }

    /// Append one unsigned byte.
    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    /// Append an unsigned 16-bit value in network byte order.
    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16(value);
        self
    }

    /// Append a raw byte run.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Finish and take the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_u8_u16() {
        let buf = [0x05, 0x01, 0x00, 0x50];
        let mut reader = WireReader::new(&buf);
        assert_eq!(reader.get_u8().unwrap(), 5);
        assert_eq!(reader.get_u8().unwrap(), 1);
        assert_eq!(reader.get_u16().unwrap(), 80);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_bytes_and_rest() {
        let buf = b"abcdef";
        let mut reader = WireReader::new(buf);
        assert_eq!(reader.get_bytes(2).unwrap(), b"ab");
        assert_eq!(reader.rest(), b"cdef");
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.rest(), b"");
    }

    #[test]
    fn test_reader_truncated_u8() {
        let mut reader = WireReader::new(&[]);
        let err = reader.get_u8().unwrap_err();
        assert!(matches!(
            err,
            SocksError::Truncated {
                needed: 1,
                remaining: 0
            }
        ));
    }

    #[test]
    fn test_reader_truncated_u16() {
        let buf = [0x00];
        let mut reader = WireReader::new(&buf);
        let err = reader.get_u16().unwrap_err();
        assert!(matches!(err, SocksError::Truncated { needed: 2, .. }));
        // The failed read must not consume anything
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_reader_truncated_bytes() {
        let buf = [1, 2, 3];
        let mut reader = WireReader::new(&buf);
        let err = reader.get_bytes(4).unwrap_err();
        assert!(matches!(
            err,
            SocksError::Truncated {
                needed: 4,
                remaining: 3
            }
        ));
        assert_eq!(reader.get_bytes(3).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_writer_round_trip() {
        let mut writer = WireWriter::new();
        writer.put_u8(5).put_u16(443).put_bytes(b"xy");
        let encoded = writer.into_bytes();
        assert_eq!(encoded, vec![5, 0x01, 0xBB, b'x', b'y']);

        let mut reader = WireReader::new(&encoded);
        assert_eq!(reader.get_u8().unwrap(), 5);
        assert_eq!(reader.get_u16().unwrap(), 443);
        assert_eq!(reader.rest(), b"xy");
    }
}
