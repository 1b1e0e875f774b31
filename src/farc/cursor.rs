//! Bounds-checked sequential reader over a byte slice.
//!
//! FArc headers and entry tables are big-endian regardless of host order,
//! so every multi-byte read goes through [`byteorder::BigEndian`]. The one
//! little-endian field in the format (split-chunk sizes) has its own method.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::CursorError;

/// Sequential reader that never reads past the end of its slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start reading at `pos` instead of the beginning of the slice.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Advance past `n` bytes and return them.
    fn take(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(CursorError::OutOfBounds {
                offset: self.pos,
                wanted: n,
                len: self.data.len(),
            })?;

        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, CursorError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        self.take(n)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read up to a `\0` terminator and advance past it.
    ///
    /// The returned slice excludes the terminator.
    pub fn read_cstring(&mut self) -> Result<&'a [u8], CursorError> {
        let start = self.pos;
        let rest = self.data.get(start..).unwrap_or_default();
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(CursorError::MalformedString { offset: start })?;

        let bytes = self.take(len)?;
        self.pos += 1;
        Ok(bytes)
    }
}
