//! Big-endian byte cursor
//!
//! Every FLV and AVC field is big-endian. [`ByteCursor`] wraps any
//! [`Read`] source, reads fixed-width integers and owned byte runs, and keeps
//! the absolute byte position so tags can record where their payload starts.
//!
//! A read that cannot be completed returns [`CursorError::ShortRead`]; the
//! partially read bytes are consumed but never returned as a value.

use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

use crate::error::CursorError;

/// Sequential big-endian reader over a byte source
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteCursor<R> {
    /// Create a cursor positioned at byte 0
    pub fn new(inner: R) -> Self {
        Self::with_position(inner, 0)
    }

    /// Create a cursor whose source already starts at `position`
    pub fn with_position(inner: R, position: u64) -> Self {
        Self { inner, position }
    }

    /// Absolute number of bytes consumed from the source
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u24(&mut self) -> Result<u32, CursorError> {
        let [b0, b1, b2] = self.read_array::<3>()?;
        Ok(u32::from_be_bytes([0, b0, b1, b2]))
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Read exactly `N` bytes
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut buf = [0u8; N];
        self.read_exact_counted(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes into an owned buffer
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, CursorError> {
        let mut buf = BytesMut::zeroed(len);
        self.read_exact_counted(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Discard exactly `len` bytes
    pub fn skip(&mut self, len: u64) -> Result<(), CursorError> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        self.position += skipped;
        if skipped < len {
            return Err(CursorError::ShortRead {
                needed: len as usize,
                available: skipped as usize,
            });
        }
        Ok(())
    }

    fn read_exact_counted(&mut self, buf: &mut [u8]) -> Result<(), CursorError> {
        let filled = self.fill(buf)?;
        if filled < buf.len() {
            return Err(CursorError::ShortRead {
                needed: buf.len(),
                available: filled,
            });
        }
        Ok(())
    }

    /// Read until `buf` is full or the source is exhausted
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, CursorError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Extract `count` bits of `value` starting at `start_bit` (bit 0 = LSB)
///
/// Bits past bit 7 read as absent, so any `count` is accepted; `count == 0`
/// yields 0.
pub fn extract_bits(value: u8, start_bit: u8, count: u8) -> u8 {
    if count == 0 || start_bit >= 8 {
        return 0;
    }
    let count = count.min(8 - start_bit);
    let mask = ((1u16 << count) - 1) as u8;
    (value >> start_bit) & mask
}
