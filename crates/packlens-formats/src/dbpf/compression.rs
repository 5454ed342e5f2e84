//! Per-resource decompression
//!
//! Payloads are decompressed one resource at a time, on demand. A failure
//! here is always recoverable: callers mark the single resource unreadable
//! and keep going, they never abort the archive.

use std::io::Read;

use flate2::read::ZlibDecoder;

use super::error::DecompressionError;
use super::index::{CompressionKind, IndexRecord};

/// Default decompression output ceiling (256 MiB)
///
/// Limits decompression output to stop compression bombs from exhausting
/// memory. Real package resources top out in the tens of megabytes.
pub const MAX_DECOMPRESSION_SIZE: usize = 256 * 1024 * 1024;

/// Decompress one resource with the default output ceiling
pub fn decompress_resource(
    data: &[u8],
    record: &IndexRecord,
) -> Result<Vec<u8>, DecompressionError> {
    decompress_resource_with_limit(data, record, MAX_DECOMPRESSION_SIZE)
}

/// Decompress one resource, bounding the output at `limit` bytes
///
/// The declared output size is checked against `limit` before any bytes are
/// inflated, and the ceiling is enforced again during the streaming decode
/// in case the stream disagrees with the declaration.
pub fn decompress_resource_with_limit(
    data: &[u8],
    record: &IndexRecord,
    limit: usize,
) -> Result<Vec<u8>, DecompressionError> {
    if record.uncompressed_size as usize > limit {
        return Err(DecompressionError::OutputTooLarge {
            size: record.uncompressed_size as usize,
            limit,
        });
    }

    match record.compression() {
        CompressionKind::None => {
            let range = checked_range(data, record.data_offset, record.uncompressed_size)?;
            Ok(range.to_vec())
        }
        CompressionKind::Zlib => {
            let range = checked_range(data, record.data_offset, record.stored_len())?;
            let decompressed = inflate(range, limit)?;
            if decompressed.len() != record.uncompressed_size as usize {
                return Err(DecompressionError::DecompressedSizeMismatch {
                    expected: record.uncompressed_size,
                    actual: decompressed.len(),
                });
            }
            Ok(decompressed)
        }
        CompressionKind::Legacy | CompressionKind::Unknown(_) => {
            Err(DecompressionError::UnsupportedCompression(record.flags))
        }
    }
}

/// Slice `length` bytes at `offset`, verifying the range fits the file
fn checked_range(data: &[u8], offset: u32, length: u32) -> Result<&[u8], DecompressionError> {
    let end = u64::from(offset) + u64::from(length);
    if end > data.len() as u64 {
        return Err(DecompressionError::RangeOutOfBounds {
            offset,
            length,
            file_len: data.len(),
        });
    }
    Ok(&data[offset as usize..end as usize])
}

/// Streaming zlib inflate with a hard output ceiling
fn inflate(compressed: &[u8], limit: usize) -> Result<Vec<u8>, DecompressionError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();

    let mut buffer = [0u8; 8192];
    loop {
        let n = decoder
            .read(&mut buffer)
            .map_err(|e| DecompressionError::Zlib(e.to_string()))?;
        if n == 0 {
            break;
        }
        if out.len() + n > limit {
            return Err(DecompressionError::OutputTooLarge {
                size: out.len() + n,
                limit,
            });
        }
        out.extend_from_slice(&buffer[..n]);
    }

    Ok(out)
}
