//! Bitcoin-style CompactSize integers (1, 3, 5 or 9 bytes on the wire).

use crate::buffer::BufferReader;
use crate::error::PbaasError;

/// Number of bytes `val` occupies when CompactSize-encoded.
pub fn encoding_length(val: u64) -> usize {
    if val < 0xFD {
        1
    } else if val <= 0xFFFF {
        3
    } else if val <= 0xFFFF_FFFF {
        5
    } else {
        9
    }
}

/// Append `val` to `buf` as a CompactSize integer.
pub fn write_compact_size(buf: &mut Vec<u8>, val: u64) {
    if val < 0xFD {
        buf.push(val as u8);
    } else if val <= 0xFFFF {
        buf.push(0xFD);
        buf.extend_from_slice(&(val as u16).to_le_bytes());
    } else if val <= 0xFFFF_FFFF {
        buf.push(0xFE);
        buf.extend_from_slice(&(val as u32).to_le_bytes());
    } else {
        buf.push(0xFF);
        buf.extend_from_slice(&val.to_le_bytes());
    }
}

/// Read a CompactSize integer at the reader's position.
///
/// Non-canonical encodings (e.g. `fd 01 00`) are accepted; re-encoding
/// always produces the canonical form.
pub fn read_compact_size(reader: &mut BufferReader<'_>) -> Result<u64, PbaasError> {
    let flag = reader.read_u8()?;
    let val = match flag {
        0x00..=0xFC => u64::from(flag),
        0xFD => u64::from(reader.read_u16()?),
        0xFE => u64::from(reader.read_u32()?),
        0xFF => reader.read_u64()?,
    };
    Ok(val)
}
