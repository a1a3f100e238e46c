//! Sequential byte cursors.
//!
//! `BufferReader` borrows a byte region and advances an offset through it;
//! every read is bounds-checked and fails with `UnexpectedEof` instead of
//! panicking. `BufferWriter` owns a growable buffer and cannot fail.

use crate::error::PbaasError;
use crate::varint;

/// Bounds-checked little-endian reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct BufferReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> BufferReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left between the cursor and the end of the region.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], PbaasError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(PbaasError::UnexpectedEof {
                offset: self.offset,
                needed: len,
            })?;
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PbaasError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, PbaasError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, PbaasError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, PbaasError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, PbaasError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_var_int(&mut self) -> Result<u64, PbaasError> {
        varint::read_compact_size(self)
    }

    /// Read a CompactSize length followed by that many bytes.
    pub fn read_var_slice(&mut self) -> Result<&'a [u8], PbaasError> {
        let len = self.read_var_int()?;
        // A length that does not fit in usize can never be satisfied.
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        self.read_slice(len)
    }
}

/// Little-endian writer appending to an owned buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferWriter {
    buf: Vec<u8>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u32(&mut self, val: u32) {
        self.write_slice(&val.to_le_bytes());
    }

    pub fn write_u64(&mut self, val: u64) {
        self.write_slice(&val.to_le_bytes());
    }

    pub fn write_var_int(&mut self, val: u64) {
        varint::write_compact_size(&mut self.buf, val);
    }

    /// Write a CompactSize length prefix followed by `bytes`.
    pub fn write_var_slice(&mut self, bytes: &[u8]) {
        self.write_var_int(bytes.len() as u64);
        self.write_slice(bytes);
    }
}

/// Encoded size of a CompactSize-prefixed byte string.
pub fn var_slice_size(bytes: &[u8]) -> usize {
    varint::encoding_length(bytes.len() as u64) + bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let bytes = [
            0x01, // u8
            0x02, 0x01, // u16
            0x04, 0x03, 0x02, 0x01, // u32
            0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, // u64
        ];
        let mut reader = BufferReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        assert_eq!(reader.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(reader.read_u64().unwrap(), 0x0102_0304_0506_0708);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn read_past_end_fails_without_advancing() {
        let bytes = [0u8; 3];
        let mut reader = BufferReader::new(&bytes);
        let err = reader.read_u32().unwrap_err();
        assert_eq!(err, PbaasError::UnexpectedEof { offset: 0, needed: 4 });
        assert_eq!(reader.offset(), 0);
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn var_slice_roundtrip() {
        let mut writer = BufferWriter::new();
        writer.write_var_slice(b"hello");
        writer.write_var_slice(&[]);
        let bytes = writer.into_inner();
        assert_eq!(bytes[0], 5);

        let mut reader = BufferReader::new(&bytes);
        assert_eq!(reader.read_var_slice().unwrap(), b"hello");
        assert_eq!(reader.read_var_slice().unwrap(), b"");
        assert!(reader.is_exhausted());
    }

    #[test]
    fn huge_var_slice_length_fails_fast() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
        let mut reader = BufferReader::new(&bytes);
        assert!(matches!(
            reader.read_var_slice(),
            Err(PbaasError::UnexpectedEof { offset: 9, .. })
        ));
    }

    #[test]
    fn var_slice_size_counts_prefix() {
        assert_eq!(var_slice_size(&[]), 1);
        assert_eq!(var_slice_size(&[0u8; 25]), 26);
        assert_eq!(var_slice_size(&[0u8; 300]), 303);
    }
}
