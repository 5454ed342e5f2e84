//! Conflict detection across archive collections
//!
//! A conflict is two or more archives colliding over the same resource:
//! either the same structural key (the game loads only one, last wins) or
//! byte-identical content shipped under different keys (duplicated payloads
//! wasting load time and masking republished packages).
//!
//! Detection is a closed set of variants behind one capability contract:
//! [`KeyConflictDetector`] and [`ContentCollisionDetector`]. New detector
//! kinds extend the [`ConflictKind`] tag set; there is no open-ended
//! inheritance seam.
//!
//! Every detector is deterministic: identical input collections produce
//! identical conflicts in identical order, which keeps reports diffable
//! across runs.

mod collision;
mod identifier;
mod registry;

pub use collision::ContentCollisionDetector;
pub use identifier::KeyConflictDetector;
pub use registry::TypeRegistry;

use packlens_formats::dbpf::ResourceKey;
use serde::Serialize;

use crate::model::{ArchiveId, ModArchive};

/// Conflict severity, ordered from advisory to game-breaking
///
/// `Low` is reserved for soft/advisory matches produced by auxiliary
/// heuristics outside this crate; the structural detectors here emit
/// `Medium` and above only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Advisory only
    Low,
    /// Structural collision without known core impact
    Medium,
    /// Collision over script hook resources
    High,
    /// Collision over core system resources; most likely to break the game
    Critical,
}

/// What kind of collision a conflict describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ConflictKind {
    /// Same structural key in more than one archive
    IdentifierCollision,
    /// Same content fingerprint (per type) in more than one archive
    ResourceCollision,
}

/// One detected conflict
///
/// Immutable after creation. `archives` preserves collection insertion
/// order, which makes report output deterministic.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    /// Collision kind
    pub kind: ConflictKind,
    /// Deterministic severity classification
    pub severity: Severity,
    /// The resource keys involved (one for identifier collisions, every
    /// colliding key for content collisions)
    pub keys: Vec<ResourceKey>,
    /// The archives involved, at least two, in insertion order
    pub archives: Vec<ArchiveId>,
}

/// Per-resource problem encountered during detection
///
/// Diagnostics are data, not errors: they ride along with the conflicts so
/// nothing is silently dropped, but they never abort detection.
#[derive(Debug, Clone, Serialize)]
pub enum Diagnostic {
    /// A resource could not be decompressed and was excluded from
    /// content-collision detection
    UnreadableResource {
        /// Archive the resource lives in
        archive: ArchiveId,
        /// The resource's key
        key: ResourceKey,
        /// Why decompression failed
        reason: String,
    },
}

/// Output of one detector pass
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Detected conflicts, sorted by [`sort_conflicts`] order
    pub conflicts: Vec<Conflict>,
    /// Per-resource diagnostics accumulated during the pass
    pub diagnostics: Vec<Diagnostic>,
}

/// Capability contract shared by all detectors
pub trait ConflictDetector {
    /// Run one pass over a full collection
    fn detect(&self, archives: &[ModArchive]) -> Detection;
}

/// Canonical conflict ordering: severity descending, then keys ascending,
/// then kind, then archive names
///
/// Total over the conflicts any one pass can produce, so output order is
/// identical across runs with identical input.
pub fn sort_conflicts(conflicts: &mut [Conflict]) {
    conflicts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.keys.cmp(&b.keys))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| {
                let names_a = a.archives.iter().map(|id| id.name.as_str());
                let names_b = b.archives.iter().map(|id| id.name.as_str());
                names_a.cmp(names_b)
            })
    });
}
