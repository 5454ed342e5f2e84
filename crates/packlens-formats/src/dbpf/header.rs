//! DBPF header parsing
//!
//! The header is the first 96 bytes of every package. Only six fields
//! matter to analysis; the rest (user version, flags, timestamps, index
//! minor version) are reserved or irrelevant here and are skipped, never
//! re-serialized.

use super::constants::{DBPF_MAGIC, HEADER_SIZE, INDEX_RECORD_SIZE, SUPPORTED_MAJOR_VERSION};
use super::error::HeaderError;

/// Parsed DBPF package header
///
/// Layout (little-endian):
/// ```text
/// offset 0x00: [u8; 4] magic            ("DBPF")
/// offset 0x04: u32     major_version    (must be 2)
/// offset 0x08: u32     minor_version    (recorded, any value accepted)
/// offset 0x0C..0x28:   reserved         (user version, flags, timestamps)
/// offset 0x28: u32     index_entry_count
/// offset 0x2C: u32     index_offset
/// offset 0x30: u32     index_byte_size
/// offset 0x34..0x60:   reserved
/// ```
///
/// Immutable once parsed. Every bound the header declares is validated
/// against the actual input length before the header is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbpfHeader {
    /// Major format version (always the supported value after validation)
    pub major_version: u32,

    /// Minor format version, recorded as-is
    pub minor_version: u32,

    /// Number of records in the index table
    pub index_entry_count: u32,

    /// Byte offset of the index table from the start of the file
    pub index_offset: u32,

    /// Total index table size in bytes
    pub index_byte_size: u32,
}

impl DbpfHeader {
    /// Parse and validate a header from the start of `data`
    ///
    /// `data` must be the complete package buffer, not just the header
    /// bytes: the declared index range is validated against its length.
    pub fn parse(data: &[u8]) -> Result<Self, HeaderError> {
        if data.len() < HEADER_SIZE {
            return Err(HeaderError::TooSmall {
                actual: data.len(),
                minimum: HEADER_SIZE,
            });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[0..4]);
        if magic != DBPF_MAGIC {
            return Err(HeaderError::BadMagic(magic));
        }

        let major_version = read_u32(data, 0x04);
        let minor_version = read_u32(data, 0x08);

        if major_version != SUPPORTED_MAJOR_VERSION {
            return Err(HeaderError::UnsupportedVersion(major_version));
        }

        let index_entry_count = read_u32(data, 0x28);
        let index_offset = read_u32(data, 0x2C);
        let index_byte_size = read_u32(data, 0x30);

        // The index may not overlap the header, and the declared range must
        // fit in the file. Widen to u64 so hostile values cannot wrap.
        let index_end = u64::from(index_offset) + u64::from(index_byte_size);
        if (index_offset as usize) < HEADER_SIZE || index_end > data.len() as u64 {
            return Err(HeaderError::IndexOutOfBounds {
                index_offset,
                index_byte_size,
                file_len: data.len(),
            });
        }

        let expected_size = u64::from(index_entry_count) * INDEX_RECORD_SIZE as u64;
        if u64::from(index_byte_size) != expected_size {
            return Err(HeaderError::IndexSizeMismatch {
                index_byte_size,
                index_entry_count,
                record_size: INDEX_RECORD_SIZE,
            });
        }

        Ok(Self {
            major_version,
            minor_version,
            index_entry_count,
            index_offset,
            index_byte_size,
        })
    }
}

#[inline]
fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
