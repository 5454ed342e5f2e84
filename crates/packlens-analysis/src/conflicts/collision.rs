//! Content fingerprint collision detection
//!
//! Catches archives that ship byte-identical payloads under different
//! nominal keys: republished packages, bundled copies of shared meshes,
//! and the like. The lookup key is (type ID, SHA-256 of the decompressed
//! payload), so identical bytes serving different resource types do not
//! cross-match.
//!
//! This is the expensive detector: it decompresses every resource in the
//! collection exactly once. Resources that fail to decompress are excluded
//! and surfaced as [`Diagnostic::UnreadableResource`], never silently
//! dropped.

use std::collections::HashMap;

use packlens_formats::dbpf::{
    MAX_DECOMPRESSION_SIZE, ResourceKey, decompress_resource_with_limit,
};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{
    Conflict, ConflictDetector, ConflictKind, Detection, Diagnostic, Severity, sort_conflicts,
};
use crate::model::{ArchiveId, ModArchive};

/// Detects byte-identical payloads shipped by more than one archive
#[derive(Debug)]
pub struct ContentCollisionDetector {
    decompression_limit: usize,
}

impl ContentCollisionDetector {
    /// Detector with the default decompression ceiling
    pub fn new() -> Self {
        Self {
            decompression_limit: MAX_DECOMPRESSION_SIZE,
        }
    }

    /// Detector with an explicit decompression ceiling
    pub fn with_limit(decompression_limit: usize) -> Self {
        Self {
            decompression_limit,
        }
    }
}

impl Default for ContentCollisionDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint index key: resource type plus payload digest
type Signature = (u32, [u8; 32]);

impl ConflictDetector for ContentCollisionDetector {
    fn detect(&self, archives: &[ModArchive]) -> Detection {
        let mut index: HashMap<Signature, Vec<(ArchiveId, ResourceKey)>> = HashMap::new();
        let mut diagnostics = Vec::new();

        for archive in archives {
            for record in archive.records() {
                let payload = match decompress_resource_with_limit(
                    archive.data(),
                    record,
                    self.decompression_limit,
                ) {
                    Ok(payload) => payload,
                    Err(e) => {
                        diagnostics.push(Diagnostic::UnreadableResource {
                            archive: archive.id().clone(),
                            key: record.key(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };

                let mut digest = [0u8; 32];
                digest.copy_from_slice(&Sha256::digest(&payload));
                index
                    .entry((record.type_id, digest))
                    .or_default()
                    .push((archive.id().clone(), record.key()));
            }
        }

        let mut conflicts = Vec::new();
        for (_, entries) in index {
            let mut owners: Vec<ArchiveId> = Vec::new();
            let mut keys = Vec::new();
            for (id, key) in entries {
                if !owners.contains(&id) {
                    owners.push(id);
                }
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            if owners.len() < 2 {
                continue;
            }
            keys.sort_unstable();
            conflicts.push(Conflict {
                kind: ConflictKind::ResourceCollision,
                severity: Severity::Medium,
                keys,
                archives: owners,
            });
        }

        sort_conflicts(&mut conflicts);
        debug!(
            archives = archives.len(),
            conflicts = conflicts.len(),
            unreadable = diagnostics.len(),
            "content collision pass complete"
        );

        Detection {
            conflicts,
            diagnostics,
        }
    }
}
