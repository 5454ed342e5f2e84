//! Dependency graph over archive identities
//!
//! Nodes are archive identities; a directed edge A → B means "A requires B".
//! The edge list is supplied by the metadata collaborator: detecting
//! dependencies is not this module's job, analyzing the resulting graph is.
//!
//! The build/freeze lifecycle is expressed in types:
//! [`DependencyGraphBuilder`] accepts nodes and edges, [`build`] freezes the
//! structure, and every query on the frozen [`DependencyGraph`] is a pure
//! function. Cycles in the edge set are a defect to report, not a
//! construction error; only [`topological_order`] refuses to operate while
//! they exist, because its contract cannot be met.
//!
//! [`build`]: DependencyGraphBuilder::build
//! [`topological_order`]: DependencyGraph::topological_order

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Graph query errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The graph contains at least one cycle, so no total load order exists
    #[error("dependency cycle present: no load order exists")]
    CyclePresent,
}

/// Impact of removing one node from the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalImpact {
    /// Nodes with a direct "requires" edge into the removed node
    pub directly_broken: BTreeSet<String>,
    /// Full reverse-reachability closure, excluding the removed node itself
    pub transitively_broken: BTreeSet<String>,
}

/// Summary counts over a frozen graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Node count
    pub nodes: usize,
    /// Edge count (duplicates were collapsed at build time)
    pub edges: usize,
    /// Whether any cycle exists
    pub has_cycle: bool,
    /// Number of cycles found by the cycle walk
    pub cycle_count: usize,
    /// Nodes with no edges in either direction
    pub isolated: usize,
}

/// Mutable building phase of the dependency graph
///
/// Single-writer by contract; not thread safe, and not meant to be. Freeze
/// with [`build`](Self::build) before sharing.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl DependencyGraphBuilder {
    /// Start an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; adding the same identity twice is a no-op
    pub fn add_node(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.indices.contains_key(&id) {
            let ix = self.graph.add_node(id.clone());
            self.indices.insert(id, ix);
        }
    }

    /// Add a "requires" edge; duplicate edges are collapsed
    ///
    /// # Panics
    ///
    /// Panics if either endpoint was never added. That is a caller bug, not
    /// bad user input: edges come from the same code that registered the
    /// nodes, so an unknown endpoint means the build sequence is wrong.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let from_ix = *self
            .indices
            .get(from)
            .unwrap_or_else(|| panic!("add_edge: node {from:?} was never added"));
        let to_ix = *self
            .indices
            .get(to)
            .unwrap_or_else(|| panic!("add_edge: node {to:?} was never added"));
        if self.graph.find_edge(from_ix, to_ix).is_none() {
            self.graph.add_edge(from_ix, to_ix, ());
        }
    }

    /// Freeze the graph; no further mutation is possible afterward
    pub fn build(self) -> DependencyGraph {
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "dependency graph frozen"
        );
        DependencyGraph {
            graph: self.graph,
            indices: self.indices,
        }
    }
}

/// Frozen dependency graph; all queries are pure
///
/// Immutable and freely shareable across threads once built.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Node identities in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|ix| self.graph[ix].as_str())
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether any dependency cycle exists
    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Every cycle reachable by a depth-first walk, in traversal order
    ///
    /// Each cycle is the node sequence from the first repeated node back
    /// around to itself: for edges A → B → C → A the cycle is `[A, B, C]`.
    /// Disjoint cycles are all reported; cycles sharing nodes are reported
    /// once per back edge encountered.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut stack: Vec<NodeIndex> = Vec::new();
        let mut cycles = Vec::new();

        // Iterative DFS so hostile edge lists cannot overflow the call
        // stack. Frame = (node, successors in insertion order, cursor).
        for start in self.graph.node_indices() {
            if marks[start.index()] != Mark::Unvisited {
                continue;
            }

            let mut frames: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
            marks[start.index()] = Mark::OnStack;
            stack.push(start);
            frames.push((start, self.successors(start), 0));

            while let Some((_, succs, cursor)) = frames.last_mut() {
                let next = succs.get(*cursor).copied();
                *cursor += 1;

                let Some(next) = next else {
                    if let Some((node, _, _)) = frames.pop() {
                        marks[node.index()] = Mark::Done;
                        stack.pop();
                    }
                    continue;
                };

                match marks[next.index()] {
                    Mark::Unvisited => {
                        marks[next.index()] = Mark::OnStack;
                        stack.push(next);
                        let succs = self.successors(next);
                        frames.push((next, succs, 0));
                    }
                    Mark::OnStack => {
                        if let Some(pos) = stack.iter().position(|&n| n == next) {
                            cycles.push(
                                stack[pos..]
                                    .iter()
                                    .map(|&n| self.graph[n].clone())
                                    .collect(),
                            );
                        }
                    }
                    Mark::Done => {}
                }
            }
        }

        cycles
    }

    /// Safe load order: every dependency precedes its dependents
    ///
    /// Kahn's algorithm over the reverse "requires" relation: a node
    /// becomes ready once all the nodes it requires are emitted. Ties are
    /// broken by node insertion order, so output is deterministic. Fails
    /// all-or-nothing with [`GraphError::CyclePresent`] when a cycle exists;
    /// callers must check cycles first and branch.
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        let mut pending: Vec<usize> = self
            .graph
            .node_indices()
            .map(|ix| {
                self.graph
                    .neighbors_directed(ix, Direction::Outgoing)
                    .count()
            })
            .collect();

        // Ready set ordered by node index, which is insertion order.
        let mut ready: BTreeSet<usize> = pending
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(ix, _)| ix)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(&ix) = ready.iter().next() {
            ready.remove(&ix);
            let node = NodeIndex::new(ix);
            order.push(self.graph[node].clone());

            for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
                let slot = &mut pending[dependent.index()];
                *slot -= 1;
                if *slot == 0 {
                    ready.insert(dependent.index());
                }
            }
        }

        if order.len() != self.graph.node_count() {
            return Err(GraphError::CyclePresent);
        }
        Ok(order)
    }

    /// What breaks if `id` is removed
    ///
    /// Unknown identities report an empty impact.
    pub fn removal_impact(&self, id: &str) -> RemovalImpact {
        let Some(&target) = self.indices.get(id) else {
            return RemovalImpact {
                directly_broken: BTreeSet::new(),
                transitively_broken: BTreeSet::new(),
            };
        };

        let directly_broken: BTreeSet<String> = self
            .graph
            .neighbors_directed(target, Direction::Incoming)
            .map(|ix| self.graph[ix].clone())
            .collect();

        // Reverse reachability closure, excluding the target itself.
        let mut transitively_broken = BTreeSet::new();
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut frontier = vec![target];
        while let Some(node) = frontier.pop() {
            for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
                if seen.insert(dependent) {
                    transitively_broken.insert(self.graph[dependent].clone());
                    frontier.push(dependent);
                }
            }
        }

        RemovalImpact {
            directly_broken,
            transitively_broken,
        }
    }

    /// Edges whose target is not in `installed`, in edge insertion order
    ///
    /// Each entry is `(dependent, missing_target)`.
    pub fn missing_dependencies(&self, installed: &HashSet<String>) -> Vec<(String, String)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| {
                let (from, to) = self.graph.edge_endpoints(edge)?;
                let target = &self.graph[to];
                if installed.contains(target) {
                    None
                } else {
                    Some((self.graph[from].clone(), target.clone()))
                }
            })
            .collect()
    }

    /// Summary counts
    pub fn stats(&self) -> GraphStats {
        let isolated = self
            .graph
            .node_indices()
            .filter(|&ix| {
                self.graph
                    .neighbors_directed(ix, Direction::Incoming)
                    .next()
                    .is_none()
                    && self
                        .graph
                        .neighbors_directed(ix, Direction::Outgoing)
                        .next()
                        .is_none()
            })
            .count();

        GraphStats {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            has_cycle: self.has_cycle(),
            cycle_count: self.find_cycles().len(),
            isolated,
        }
    }

    /// Successors of a node in edge insertion order
    ///
    /// petgraph iterates neighbors most-recent-first; reverse restores the
    /// order edges were added in, which keeps traversals deterministic in a
    /// way that reads naturally in reports.
    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut succs: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        succs.reverse();
        succs
    }
}
