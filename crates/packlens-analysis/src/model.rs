//! Archive identity and the per-archive analysis entity

use std::fmt;

use packlens_formats::dbpf::{DbpfError, IndexRecord, ParsedArchive, ResourceKey};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// SHA-256 digest of an archive's raw bytes
///
/// Two archives with the same hash are byte-identical regardless of their
/// file names; collection tooling uses this for dedup and caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a byte buffer
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

/// Archive identity: display name plus content hash
///
/// The name is whatever the caller supplied (typically the file name); the
/// hash pins the identity to the actual bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArchiveId {
    /// Caller-supplied display name
    pub name: String,
    /// Digest of the archive bytes
    pub content_hash: ContentHash,
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A fully loaded archive under analysis
///
/// Owns the raw bytes, the decoded index, and the externally supplied
/// metadata (declared dependencies, declared version). Immutable once built;
/// dropped when the enclosing collection analysis completes. Detectors and
/// the dependency graph borrow from it, they never own it.
#[derive(Debug, Clone)]
pub struct ModArchive {
    id: ArchiveId,
    data: Vec<u8>,
    records: Vec<IndexRecord>,
    requires: Vec<String>,
    version: Option<String>,
}

impl ModArchive {
    /// Parse raw package bytes into an analysis entity
    ///
    /// `requires` and `version` come from the metadata collaborator; the
    /// core only consumes them.
    pub fn from_bytes(
        name: impl Into<String>,
        data: Vec<u8>,
        requires: Vec<String>,
        version: Option<String>,
    ) -> Result<Self, DbpfError> {
        let parsed = ParsedArchive::parse(&data)?;
        let id = ArchiveId {
            name: name.into(),
            content_hash: ContentHash::of(&data),
        };
        Ok(Self {
            id,
            records: parsed.records().to_vec(),
            data,
            requires,
            version,
        })
    }

    /// Archive identity
    pub fn id(&self) -> &ArchiveId {
        &self.id
    }

    /// Raw package bytes (payload decompression reads from these)
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Index records, in file order
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Resource keys of every record, in file order
    pub fn resource_keys(&self) -> impl Iterator<Item = ResourceKey> + '_ {
        self.records.iter().map(IndexRecord::key)
    }

    /// Declared dependency identities
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// Declared version, if the metadata carried one
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
