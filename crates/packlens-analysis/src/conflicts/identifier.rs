//! Structural key collision detection
//!
//! Two archives carrying the same (type, group, instance) key fight over one
//! slot at load time: the game keeps whichever loads last. This detector
//! finds every such key across a collection in a single O(total records)
//! pass.

use std::collections::HashMap;

use packlens_formats::dbpf::ResourceKey;
use tracing::debug;

use super::{Conflict, ConflictDetector, ConflictKind, Detection, TypeRegistry, sort_conflicts};
use crate::model::{ArchiveId, ModArchive};

/// Detects archives sharing the same structural resource key
///
/// Severity is a deterministic function of the key's type ID against the
/// supplied [`TypeRegistry`]: core system types are Critical, script hooks
/// High, everything else Medium.
#[derive(Debug)]
pub struct KeyConflictDetector<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> KeyConflictDetector<'a> {
    /// Create a detector over the given classification tables
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }
}

impl ConflictDetector for KeyConflictDetector<'_> {
    fn detect(&self, archives: &[ModArchive]) -> Detection {
        // key -> archives carrying it, insertion-ordered, one entry per
        // archive even when an archive repeats a key internally
        let mut index: HashMap<ResourceKey, Vec<&ArchiveId>> = HashMap::new();

        for archive in archives {
            for key in archive.resource_keys() {
                let owners = index.entry(key).or_default();
                if !owners.contains(&archive.id()) {
                    owners.push(archive.id());
                }
            }
        }

        let mut conflicts: Vec<Conflict> = index
            .into_iter()
            .filter(|(_, owners)| owners.len() >= 2)
            .map(|(key, owners)| Conflict {
                kind: ConflictKind::IdentifierCollision,
                severity: self.registry.collision_severity(key.type_id),
                keys: vec![key],
                archives: owners.into_iter().cloned().collect(),
            })
            .collect();

        sort_conflicts(&mut conflicts);
        debug!(
            archives = archives.len(),
            conflicts = conflicts.len(),
            "key collision pass complete"
        );

        Detection {
            conflicts,
            diagnostics: Vec::new(),
        }
    }
}
