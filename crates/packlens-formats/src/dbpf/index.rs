//! DBPF index table decoding
//!
//! The index is a flat table of fixed 32-byte records. Decoding is purely
//! structural: no payload is touched and no decompression happens here.

use std::fmt;

use serde::Serialize;

use super::constants::{COMPRESSION_LEGACY, COMPRESSION_NONE, COMPRESSION_ZLIB, INDEX_RECORD_SIZE};
use super::error::IndexError;
use super::header::DbpfHeader;

/// Composite resource identity: (type, group, instance)
///
/// Unique within one archive; deliberately not unique across archives, since
/// cross-archive duplication is exactly what conflict detection looks for.
/// Equality is exact, no normalization. Ordering is lexicographic over the
/// tuple, which gives detectors a deterministic sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceKey {
    /// Resource type ID
    pub type_id: u32,
    /// Resource group ID
    pub group_id: u32,
    /// Resource instance ID
    pub instance_id: u64,
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}:{:08X}:{:016X}",
            self.type_id, self.group_id, self.instance_id
        )
    }
}

/// Compression method declared by a record's flags field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompressionKind {
    /// Payload stored as-is
    None,
    /// zlib/deflate stream
    Zlib,
    /// Legacy block compression, recognized but not decoded
    Legacy,
    /// Unknown discriminant
    Unknown(u32),
}

impl CompressionKind {
    /// Classify a raw flags value
    pub fn from_flags(flags: u32) -> Self {
        match flags {
            COMPRESSION_NONE => Self::None,
            COMPRESSION_ZLIB => Self::Zlib,
            COMPRESSION_LEGACY => Self::Legacy,
            other => Self::Unknown(other),
        }
    }
}

/// One index table record
///
/// Binary layout (32 bytes, little-endian):
/// ```text
/// offset 0x00: u32 type_id
/// offset 0x04: u32 group_id
/// offset 0x08: u64 instance_id
/// offset 0x10: u32 data_offset        (payload position in the file)
/// offset 0x14: u32 uncompressed_size  (exact decompressed length)
/// offset 0x18: u32 stored_size        (bytes on disk; 0 = uncompressed_size)
/// offset 0x1C: u32 flags              (compression discriminant)
/// ```
///
/// Immutable after decoding. File order carries no meaning; downstream
/// consumers identify records by [`ResourceKey`], never by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexRecord {
    /// Resource type ID
    pub type_id: u32,
    /// Resource group ID
    pub group_id: u32,
    /// Resource instance ID
    pub instance_id: u64,
    /// Payload offset from the start of the file
    pub data_offset: u32,
    /// Exact decompressed payload length
    pub uncompressed_size: u32,
    /// Bytes occupied in the file; 0 means "same as uncompressed_size"
    pub stored_size: u32,
    /// Compression discriminant
    pub flags: u32,
}

impl IndexRecord {
    /// The record's composite identity
    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            type_id: self.type_id,
            group_id: self.group_id,
            instance_id: self.instance_id,
        }
    }

    /// Compression method declared by the flags field
    pub fn compression(&self) -> CompressionKind {
        CompressionKind::from_flags(self.flags)
    }

    /// Bytes this resource actually occupies in the file
    pub fn stored_len(&self) -> u32 {
        if self.stored_size == 0 {
            self.uncompressed_size
        } else {
            self.stored_size
        }
    }

    fn decode(data: &[u8]) -> Self {
        Self {
            type_id: read_u32(data, 0x00),
            group_id: read_u32(data, 0x04),
            instance_id: read_u64(data, 0x08),
            data_offset: read_u32(data, 0x10),
            uncompressed_size: read_u32(data, 0x14),
            stored_size: read_u32(data, 0x18),
            flags: read_u32(data, 0x1C),
        }
    }
}

/// Decode the index table described by a validated header
///
/// Reads exactly `header.index_entry_count` records starting at
/// `header.index_offset`, in file order. The available byte count is
/// re-checked against the header's promise before any record is decoded.
pub fn read_index(data: &[u8], header: &DbpfHeader) -> Result<Vec<IndexRecord>, IndexError> {
    let offset = header.index_offset as usize;
    let promised = header.index_byte_size as usize;
    let available = data.len().saturating_sub(offset);

    if available < promised {
        return Err(IndexError::TruncatedRecord {
            index_offset: header.index_offset,
            promised,
            available,
        });
    }

    let mut records = Vec::with_capacity(header.index_entry_count as usize);
    let mut pos = offset;
    for _ in 0..header.index_entry_count {
        records.push(IndexRecord::decode(&data[pos..pos + INDEX_RECORD_SIZE]));
        pos += INDEX_RECORD_SIZE;
    }

    Ok(records)
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

#[inline]
fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record_bytes(record: &IndexRecord) -> Vec<u8> {
        let mut out = Vec::with_capacity(INDEX_RECORD_SIZE);
        out.extend_from_slice(&record.type_id.to_le_bytes());
        out.extend_from_slice(&record.group_id.to_le_bytes());
        out.extend_from_slice(&record.instance_id.to_le_bytes());
        out.extend_from_slice(&record.data_offset.to_le_bytes());
        out.extend_from_slice(&record.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&record.stored_size.to_le_bytes());
        out.extend_from_slice(&record.flags.to_le_bytes());
        out
    }

    fn package_with_records(records: &[IndexRecord]) -> (Vec<u8>, DbpfHeader) {
        let mut data = vec![0u8; 96];
        data[0..4].copy_from_slice(b"DBPF");
        data[0x04..0x08].copy_from_slice(&2u32.to_le_bytes());
        data[0x28..0x2C].copy_from_slice(&(records.len() as u32).to_le_bytes());
        data[0x2C..0x30].copy_from_slice(&96u32.to_le_bytes());
        data[0x30..0x34].copy_from_slice(&((records.len() * 32) as u32).to_le_bytes());
        for record in records {
            data.extend_from_slice(&record_bytes(record));
        }
        let header = DbpfHeader::parse(&data).expect("valid synthetic package");
        (data, header)
    }

    #[test]
    fn empty_index_yields_empty_sequence() {
        let (data, header) = package_with_records(&[]);
        let records = read_index(&data, &header).expect("empty index is valid");
        assert!(records.is_empty());
    }

    #[test]
    fn decodes_records_in_file_order() {
        let first = IndexRecord {
            type_id: 0x545503B2,
            group_id: 0,
            instance_id: 0xAABB_CCDD_EEFF_0011,
            data_offset: 160,
            uncompressed_size: 64,
            stored_size: 0,
            flags: 0,
        };
        let second = IndexRecord {
            type_id: 0xD382BF57,
            group_id: 7,
            instance_id: 42,
            data_offset: 224,
            uncompressed_size: 128,
            stored_size: 90,
            flags: 0x5A42,
        };
        let (data, header) = package_with_records(&[first, second]);
        let records = read_index(&data, &header).expect("two records decode");
        assert_eq!(records, vec![first, second]);
        assert_eq!(records[1].compression(), CompressionKind::Zlib);
    }

    #[test]
    fn truncated_index_is_rejected() {
        let record = IndexRecord {
            type_id: 1,
            group_id: 2,
            instance_id: 3,
            data_offset: 128,
            uncompressed_size: 16,
            stored_size: 0,
            flags: 0,
        };
        let (mut data, header) = package_with_records(&[record, record, record]);
        // Header promises 96 index bytes but the file stops 10 bytes short.
        data.truncate(data.len() - 10);
        match read_index(&data, &header) {
            Err(IndexError::TruncatedRecord {
                promised,
                available,
                ..
            }) => {
                assert_eq!(promised, 96);
                assert_eq!(available, 86);
            }
            other => panic!("expected TruncatedRecord, got {other:?}"),
        }
    }

    #[test]
    fn stored_len_falls_back_to_uncompressed_size() {
        let record = IndexRecord {
            type_id: 1,
            group_id: 0,
            instance_id: 0,
            data_offset: 0,
            uncompressed_size: 512,
            stored_size: 0,
            flags: 0,
        };
        assert_eq!(record.stored_len(), 512);
    }

    #[test]
    fn key_ordering_is_tuple_ordering() {
        let a = ResourceKey {
            type_id: 1,
            group_id: 9,
            instance_id: 9,
        };
        let b = ResourceKey {
            type_id: 2,
            group_id: 0,
            instance_id: 0,
        };
        let c = ResourceKey {
            type_id: 2,
            group_id: 0,
            instance_id: 1,
        };
        assert!(a < b && b < c);
    }

    #[test]
    fn compression_kind_classification() {
        assert_eq!(CompressionKind::from_flags(0), CompressionKind::None);
        assert_eq!(CompressionKind::from_flags(0x5A42), CompressionKind::Zlib);
        assert_eq!(CompressionKind::from_flags(0xFFFF), CompressionKind::Legacy);
        assert_eq!(
            CompressionKind::from_flags(0xDEAD),
            CompressionKind::Unknown(0xDEAD)
        );
    }
}
