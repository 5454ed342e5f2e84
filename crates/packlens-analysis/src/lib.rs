//! Conflict detection and dependency analysis over mod package collections
//!
//! This crate is the analysis layer of packlens. It consumes packages parsed
//! by `packlens-formats` and answers the questions that matter before the
//! game launches: which packages fight over the same resources, which ship
//! duplicated content, what order the collection must load in, and what
//! breaks when a package is removed.
//!
//! # Pipeline
//!
//! ```text
//! bytes -> ParsedArchive -> ModArchive ──┐
//! bytes -> ParsedArchive -> ModArchive ──┼─> detectors -> conflicts
//! bytes -> (structural error, recorded) ─┘      │
//!                                               └─> graph -> cycles, order,
//!                                                   removal impact
//! ```
//!
//! Archive parsing is embarrassingly parallel and fans out across worker
//! threads; detection and graph analysis run as a single-threaded reduction
//! over the immutable per-archive results. One corrupt package never aborts
//! analysis of the rest of the collection.

#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)] // Backwards compatibility

pub mod analyzer;
pub mod conflicts;
pub mod graph;
pub mod model;

pub use analyzer::{
    AnalysisReport, ArchiveFailure, ArchiveInput, ArchiveLoadError, ByteSource, CollectionAnalyzer,
};
pub use conflicts::{
    Conflict, ConflictDetector, ConflictKind, ContentCollisionDetector, Detection, Diagnostic,
    KeyConflictDetector, Severity, TypeRegistry,
};
pub use graph::{DependencyGraph, DependencyGraphBuilder, GraphError, RemovalImpact};
pub use model::{ArchiveId, ContentHash, ModArchive};
