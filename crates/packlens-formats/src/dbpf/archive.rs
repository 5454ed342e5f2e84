//! Whole-archive parsing
//!
//! [`ParsedArchive`] is the single entry point the analysis layer uses:
//! header validation plus index decoding in one call, with lookup helpers
//! over the resulting records.

use super::error::DbpfError;
use super::header::DbpfHeader;
use super::index::{IndexRecord, ResourceKey, read_index};

/// A fully indexed package
///
/// Holds the validated header and every index record, in file order.
/// Immutable after construction. Payload bytes are not retained here; the
/// caller keeps the file buffer and pairs it with records for on-demand
/// decompression.
#[derive(Debug, Clone)]
pub struct ParsedArchive {
    header: DbpfHeader,
    records: Vec<IndexRecord>,
}

impl ParsedArchive {
    /// Parse a complete package buffer
    pub fn parse(data: &[u8]) -> Result<Self, DbpfError> {
        let header = DbpfHeader::parse(data)?;
        let records = read_index(data, &header)?;
        Ok(Self { header, records })
    }

    /// The validated header
    pub fn header(&self) -> &DbpfHeader {
        &self.header
    }

    /// All index records, in file order
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Number of resources in the package
    pub fn resource_count(&self) -> usize {
        self.records.len()
    }

    /// Records whose type matches `type_id`, in file order
    pub fn resources_by_type(&self, type_id: u32) -> impl Iterator<Item = &IndexRecord> {
        self.records.iter().filter(move |r| r.type_id == type_id)
    }

    /// Whether any record carries the given key
    pub fn contains_key(&self, key: &ResourceKey) -> bool {
        self.records.iter().any(|r| r.key() == *key)
    }
}
