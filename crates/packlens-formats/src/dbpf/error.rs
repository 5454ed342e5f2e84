//! DBPF error types

use thiserror::Error;

/// Header validation errors
///
/// All variants are structural: the archive that produced one cannot be
/// analyzed at all. Callers analyzing a collection record the failure and
/// move on to the next archive.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// Input shorter than the fixed header size
    #[error("file too small: got {actual} bytes, header needs {minimum}")]
    TooSmall {
        /// Actual input length
        actual: usize,
        /// Fixed header size
        minimum: usize,
    },

    /// First four bytes are not the DBPF tag
    #[error("bad magic: expected \"DBPF\", got {0:02x?}")]
    BadMagic([u8; 4]),

    /// Major version other than the single supported value
    #[error("unsupported DBPF major version: {0}")]
    UnsupportedVersion(u32),

    /// Declared index range falls outside the file
    #[error(
        "index out of bounds: offset {index_offset} + size {index_byte_size} \
         exceeds file length {file_len}"
    )]
    IndexOutOfBounds {
        /// Declared index offset
        index_offset: u32,
        /// Declared index size in bytes
        index_byte_size: u32,
        /// Actual file length
        file_len: usize,
    },

    /// Declared index size disagrees with the entry count
    #[error(
        "index size mismatch: {index_byte_size} bytes declared for \
         {index_entry_count} records of {record_size} bytes"
    )]
    IndexSizeMismatch {
        /// Declared index size in bytes
        index_byte_size: u32,
        /// Declared record count
        index_entry_count: u32,
        /// Fixed record size
        record_size: usize,
    },
}

/// Index table decoding errors
#[derive(Debug, Error)]
pub enum IndexError {
    /// Fewer bytes remain at the index offset than the header promised
    ///
    /// Re-checked here even though the header already validated bounds,
    /// because header fields are attacker-influenced.
    #[error("truncated index: {promised} bytes promised at offset {index_offset}, {available} available")]
    TruncatedRecord {
        /// Declared index offset
        index_offset: u32,
        /// Bytes the header promised
        promised: usize,
        /// Bytes actually available
        available: usize,
    },
}

/// Per-resource decompression errors
///
/// These are recoverable: the resource is unreadable but the archive and its
/// other resources remain valid. Callers skip the resource and continue.
#[derive(Debug, Error)]
pub enum DecompressionError {
    /// Resource byte range exceeds the file
    #[error("resource range out of bounds: offset {offset} + {length} exceeds file length {file_len}")]
    RangeOutOfBounds {
        /// Resource data offset
        offset: u32,
        /// Bytes the record claims to occupy
        length: u32,
        /// Actual file length
        file_len: usize,
    },

    /// Decompressed output length differs from the declared size
    #[error("decompressed size mismatch: expected {expected}, got {actual}")]
    DecompressedSizeMismatch {
        /// Declared uncompressed size
        expected: u32,
        /// Actual decompressed length
        actual: usize,
    },

    /// Compression method this parser does not decode
    #[error("unsupported compression method: flags 0x{0:08X}")]
    UnsupportedCompression(u32),

    /// Output size exceeds the decompression ceiling
    ///
    /// Raised for a declared size above the limit before any inflation, and
    /// again from the streaming decode if the stream outgrows the limit.
    #[error("output size {size} exceeds limit {limit}")]
    OutputTooLarge {
        /// Declared or observed output size
        size: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// The zlib stream itself is corrupt
    #[error("zlib decode failed: {0}")]
    Zlib(String),
}

/// Umbrella error for whole-archive parsing
#[derive(Debug, Error)]
pub enum DbpfError {
    /// Header validation failed
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// Index decoding failed
    #[error(transparent)]
    Index(#[from] IndexError),
}
