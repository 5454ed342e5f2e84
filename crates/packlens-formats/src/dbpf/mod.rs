//! DBPF (Database Packed File) package parsing
//!
//! DBPF is the indexed-archive container used by the game's mod packages.
//! A package consists of a fixed 96-byte header, an index table of fixed
//! 32-byte records, and resource payload data that may be zlib-compressed
//! per resource.
//!
//! ```text
//! Package layout:
//! [ Header (96 bytes) ][ ... payload ... ][ Index (32 bytes * count) ]
//! ```
//!
//! The index table may sit anywhere at or after the header; its location and
//! size are declared in the header and validated against the file length.
//!
//! # Usage
//!
//! ```rust
//! use packlens_formats::dbpf::{ParsedArchive, decompress_resource};
//!
//! # fn example(data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let archive = ParsedArchive::parse(data)?;
//! for record in archive.records() {
//!     match decompress_resource(data, record) {
//!         Ok(payload) => println!("{}: {} bytes", record.key(), payload.len()),
//!         Err(e) => println!("{}: unreadable ({e})", record.key()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod archive;
mod compression;
mod error;
mod header;
mod index;

pub use archive::ParsedArchive;
pub use compression::{
    MAX_DECOMPRESSION_SIZE, decompress_resource, decompress_resource_with_limit,
};
pub use error::{DbpfError, DecompressionError, HeaderError, IndexError};
pub use header::DbpfHeader;
pub use index::{CompressionKind, IndexRecord, ResourceKey, read_index};

/// DBPF format constants
pub mod constants {
    /// Fixed header size in bytes
    pub const HEADER_SIZE: usize = 96;

    /// Magic tag at offset 0 of every package
    pub const DBPF_MAGIC: [u8; 4] = *b"DBPF";

    /// The single supported major format version
    pub const SUPPORTED_MAJOR_VERSION: u32 = 2;

    /// Size of each index record in bytes
    pub const INDEX_RECORD_SIZE: usize = 32;

    /// Compression flag value: payload stored uncompressed
    pub const COMPRESSION_NONE: u32 = 0x0000_0000;

    /// Compression flag value: zlib/deflate stream ("ZB" tag)
    pub const COMPRESSION_ZLIB: u32 = 0x0000_5A42;

    /// Compression flag value: legacy block compression (recognized, not decoded)
    pub const COMPRESSION_LEGACY: u32 = 0x0000_FFFF;
}
