//! Collection analysis composition root
//!
//! [`CollectionAnalyzer`] wires the core together: read each archive's bytes
//! from its source, parse in parallel, run the detectors, build the
//! dependency graph from declared metadata, and hand back one
//! [`AnalysisReport`].
//!
//! Failure policy: a structurally broken archive is recorded and skipped;
//! the report says "analyzed with N archives skipped", never "aborted".
//! Resource-level problems become diagnostics on the report. Nothing in this
//! module opens files; byte access goes through [`ByteSource`].

use std::collections::HashSet;
use std::io;

use packlens_formats::dbpf::DbpfError;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::conflicts::{
    Conflict, ConflictDetector, ContentCollisionDetector, Diagnostic, KeyConflictDetector,
    Severity, TypeRegistry, sort_conflicts,
};
use crate::graph::{DependencyGraph, DependencyGraphBuilder};
use crate::model::ModArchive;

/// Byte access supplied by the file-access collaborator
///
/// The core never opens files; whatever owns the archive bytes (a file
/// reader, an mmap, a network cache) implements this and hands buffers in.
pub trait ByteSource {
    /// Produce the complete archive bytes
    fn read_all(&self) -> io::Result<Vec<u8>>;
}

impl ByteSource for Vec<u8> {
    fn read_all(&self) -> io::Result<Vec<u8>> {
        Ok(self.clone())
    }
}

impl ByteSource for &[u8] {
    fn read_all(&self) -> io::Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

/// One archive to analyze: identity name, byte source, declared metadata
///
/// `requires` and `version` come from the metadata collaborator that
/// inspects package descriptions; the core only consumes the result.
#[derive(Debug)]
pub struct ArchiveInput<S> {
    /// Display name (typically the file name)
    pub name: String,
    /// Where the bytes come from
    pub source: S,
    /// Declared dependency identities
    pub requires: Vec<String>,
    /// Declared version, if any
    pub version: Option<String>,
}

impl<S> ArchiveInput<S> {
    /// Input with no declared metadata
    pub fn new(name: impl Into<String>, source: S) -> Self {
        Self {
            name: name.into(),
            source,
            requires: Vec::new(),
            version: None,
        }
    }

    /// Attach declared dependencies
    pub fn with_requires(mut self, requires: Vec<String>) -> Self {
        self.requires = requires;
        self
    }

    /// Attach a declared version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Why an archive was skipped
#[derive(Debug, Error)]
pub enum ArchiveLoadError {
    /// The byte source failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The bytes are not a structurally valid package
    #[error(transparent)]
    Parse(#[from] DbpfError),
}

/// One skipped archive with its reason
#[derive(Debug)]
pub struct ArchiveFailure {
    /// The input's display name
    pub name: String,
    /// What went wrong
    pub error: ArchiveLoadError,
}

/// Unified result of one collection analysis
#[derive(Debug)]
pub struct AnalysisReport {
    /// Successfully parsed archives, in input order
    pub archives: Vec<ModArchive>,
    /// Archives skipped due to I/O or structural errors, in input order
    pub failures: Vec<ArchiveFailure>,
    /// All detected conflicts in canonical order
    pub conflicts: Vec<Conflict>,
    /// Per-resource diagnostics accumulated by the detectors
    pub diagnostics: Vec<Diagnostic>,
    /// The frozen dependency graph (parsed archives plus declared targets)
    pub graph: DependencyGraph,
    /// Every dependency cycle found, reported as data
    pub cycles: Vec<Vec<String>>,
    /// Safe load order; `None` exactly when cycles exist
    pub load_order: Option<Vec<String>>,
    /// Declared dependencies that are not present in the collection
    pub missing_dependencies: Vec<(String, String)>,
}

impl AnalysisReport {
    /// Conflicts at or above a severity floor
    pub fn conflicts_at_least(&self, floor: Severity) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| c.severity >= floor)
    }

    /// Whether any conflict is Critical
    pub fn has_critical_conflicts(&self) -> bool {
        self.conflicts_at_least(Severity::Critical).next().is_some()
    }

    /// Number of archives skipped due to corruption or I/O failure
    pub fn skipped_count(&self) -> usize {
        self.failures.len()
    }
}

/// Analyzer configuration and entry point
#[derive(Debug)]
pub struct CollectionAnalyzer {
    registry: TypeRegistry,
    content_collisions: bool,
}

impl CollectionAnalyzer {
    /// Analyzer with the default type tables and both detectors enabled
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::default(),
            content_collisions: true,
        }
    }

    /// Substitute alternate type classification tables
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Disable the content-collision pass (it decompresses every resource,
    /// which dominates analysis cost on large collections)
    pub fn without_content_collisions(mut self) -> Self {
        self.content_collisions = false;
        self
    }

    /// Analyze a whole collection
    pub fn analyze<S: ByteSource + Sync>(&self, inputs: &[ArchiveInput<S>]) -> AnalysisReport {
        // Parse phase: embarrassingly parallel, one immutable result per
        // archive, input order preserved.
        let outcomes: Vec<Result<ModArchive, ArchiveFailure>> = inputs
            .par_iter()
            .map(|input| {
                let load = || -> Result<ModArchive, ArchiveLoadError> {
                    let data = input.source.read_all()?;
                    Ok(ModArchive::from_bytes(
                        input.name.clone(),
                        data,
                        input.requires.clone(),
                        input.version.clone(),
                    )?)
                };
                load().map_err(|error| ArchiveFailure {
                    name: input.name.clone(),
                    error,
                })
            })
            .collect();

        let mut archives = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(archive) => archives.push(archive),
                Err(failure) => {
                    warn!(
                        archive = %failure.name,
                        error = %failure.error,
                        "skipping archive"
                    );
                    failures.push(failure);
                }
            }
        }
        debug!(
            parsed = archives.len(),
            skipped = failures.len(),
            "collection parse phase complete"
        );

        // Detection phase: single-threaded reduction over all archives.
        let mut conflicts = Vec::new();
        let mut diagnostics = Vec::new();

        let key_pass = KeyConflictDetector::new(&self.registry).detect(&archives);
        conflicts.extend(key_pass.conflicts);
        diagnostics.extend(key_pass.diagnostics);

        if self.content_collisions {
            let content_pass = ContentCollisionDetector::new().detect(&archives);
            conflicts.extend(content_pass.conflicts);
            diagnostics.extend(content_pass.diagnostics);
        }
        sort_conflicts(&mut conflicts);

        // Graph phase: nodes for every parsed archive plus every declared
        // target, edges in declaration order.
        let mut builder = DependencyGraphBuilder::new();
        for archive in &archives {
            builder.add_node(archive.id().name.clone());
        }
        for archive in &archives {
            for target in archive.requires() {
                builder.add_node(target.clone());
                builder.add_edge(&archive.id().name, target);
            }
        }
        let graph = builder.build();

        let cycles = graph.find_cycles();
        let load_order = graph.topological_order().ok();
        let installed: HashSet<String> = archives
            .iter()
            .map(|a| a.id().name.clone())
            .collect();
        let missing_dependencies = graph.missing_dependencies(&installed);

        debug!(
            conflicts = conflicts.len(),
            cycles = cycles.len(),
            missing = missing_dependencies.len(),
            "collection analysis complete"
        );

        AnalysisReport {
            archives,
            failures,
            conflicts,
            diagnostics,
            graph,
            cycles,
            load_order,
            missing_dependencies,
        }
    }
}

impl Default for CollectionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
