//! Citation graph representation
//!
//! Directed graph of resolvable papers, edges pointing from the citing
//! paper to the cited one. Built once by the assembler, then read-only.

use refgraph_common::errors::{AppError, Result};
use refgraph_common::{PaperId, PaperRecord, Year};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Node in the citation graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperNode {
    pub id: PaperId,

    pub title: String,

    pub venue: String,

    pub year: Year,

    /// First-discovery depth from the seed
    pub depth: u32,
}

impl PaperNode {
    pub fn from_record(record: &PaperRecord, depth: u32) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            venue: record.venue.clone(),
            year: record.year,
            depth,
        }
    }
}

/// In-memory citation graph
#[derive(Debug, Clone)]
pub struct CitationGraph {
    seed: PaperId,

    max_depth: u32,

    /// All nodes with their metadata
    nodes: BTreeMap<PaperId, PaperNode>,

    /// Adjacency list: paper_id -> papers it cites
    outgoing: BTreeMap<PaperId, BTreeSet<PaperId>>,

    /// Reverse adjacency: paper_id -> papers citing it
    incoming: BTreeMap<PaperId, BTreeSet<PaperId>>,

    edge_count: usize,

    /// Referenced papers with no local record, not part of the node set
    missing: BTreeSet<PaperId>,

    /// Citations whose target is in `missing`
    frontier_citations: usize,
}

impl CitationGraph {
    /// Create an empty graph for a traversal from `seed`
    pub fn new(seed: PaperId, max_depth: u32) -> Self {
        Self {
            seed,
            max_depth,
            nodes: BTreeMap::new(),
            outgoing: BTreeMap::new(),
            incoming: BTreeMap::new(),
            edge_count: 0,
            missing: BTreeSet::new(),
            frontier_citations: 0,
        }
    }

    /// Add a node, keeping the first one inserted for an id
    pub fn add_node(&mut self, node: PaperNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Add an edge between two existing nodes.
    ///
    /// Returns `Ok(false)` when the edge was already present.
    pub fn add_edge(&mut self, citing: &PaperId, cited: &PaperId) -> Result<bool> {
        for endpoint in [citing, cited] {
            if !self.nodes.contains_key(endpoint) {
                return Err(AppError::Validation {
                    message: format!("edge {} -> {} references unknown node {}", citing, cited, endpoint),
                    field: Some("edges".to_string()),
                });
            }
        }

        let inserted = self
            .outgoing
            .entry(citing.clone())
            .or_default()
            .insert(cited.clone());

        if inserted {
            self.incoming
                .entry(cited.clone())
                .or_default()
                .insert(citing.clone());
            self.edge_count += 1;
        }

        Ok(inserted)
    }

    pub(crate) fn set_missing(&mut self, missing: BTreeSet<PaperId>) {
        self.missing = missing;
    }

    pub(crate) fn add_frontier_citation(&mut self) {
        self.frontier_citations += 1;
    }

    pub fn seed(&self) -> &PaperId {
        &self.seed
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn node(&self, paper_id: &PaperId) -> Option<&PaperNode> {
        self.nodes.get(paper_id)
    }

    pub fn contains(&self, paper_id: &PaperId) -> bool {
        self.nodes.contains_key(paper_id)
    }

    /// Get all nodes, in id order
    pub fn nodes(&self) -> impl Iterator<Item = &PaperNode> {
        self.nodes.values()
    }

    /// Get all edges as (citing, cited), in order
    pub fn edges(&self) -> impl Iterator<Item = (&PaperId, &PaperId)> {
        self.outgoing
            .iter()
            .flat_map(|(citing, cited)| cited.iter().map(move |c| (citing, c)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn missing(&self) -> &BTreeSet<PaperId> {
        &self.missing
    }

    pub fn frontier_citations(&self) -> usize {
        self.frontier_citations
    }

    /// Get papers cited by this paper
    pub fn references(&self, paper_id: &PaperId) -> impl Iterator<Item = &PaperId> {
        self.outgoing.get(paper_id).into_iter().flatten()
    }

    /// Get papers citing this paper
    pub fn citations(&self, paper_id: &PaperId) -> impl Iterator<Item = &PaperId> {
        self.incoming.get(paper_id).into_iter().flatten()
    }

    /// Get citation count (incoming edges)
    pub fn citation_count(&self, paper_id: &PaperId) -> usize {
        self.incoming.get(paper_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Get reference count (outgoing edges)
    pub fn reference_count(&self, paper_id: &PaperId) -> usize {
        self.outgoing.get(paper_id).map(|s| s.len()).unwrap_or(0)
    }

    pub fn self_loop_count(&self) -> usize {
        self.outgoing
            .iter()
            .filter(|(id, cited)| cited.contains(*id))
            .count()
    }

    /// Nodes without outgoing edges
    pub fn leaves(&self) -> impl Iterator<Item = &PaperNode> {
        self.nodes
            .values()
            .filter(move |node| self.reference_count(&node.id) == 0)
    }

    /// Deepest first-discovery depth among the nodes
    pub fn deepest_level(&self) -> Option<u32> {
        self.nodes.values().map(|n| n.depth).max()
    }

    /// Breadth-first neighbourhood of `start` up to `depth` hops,
    /// excluding `start` itself
    pub fn neighbourhood(
        &self,
        start: &PaperId,
        depth: usize,
        direction: TraversalDirection,
    ) -> Vec<(PaperId, usize)> {
        let mut visited = BTreeSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        if !self.contains(start) {
            return result;
        }
        visited.insert(start.clone());
        queue.push_back((start, 0usize));

        while let Some((current, current_depth)) = queue.pop_front() {
            if current_depth == depth {
                continue;
            }

            let forward = matches!(direction, TraversalDirection::Forward | TraversalDirection::Both)
                .then(|| self.references(current))
                .into_iter()
                .flatten();
            let backward = matches!(direction, TraversalDirection::Backward | TraversalDirection::Both)
                .then(|| self.citations(current))
                .into_iter()
                .flatten();

            for neighbour in forward.chain(backward) {
                if visited.insert(neighbour.clone()) {
                    result.push((neighbour.clone(), current_depth + 1));
                    queue.push_back((neighbour, current_depth + 1));
                }
            }
        }

        result
    }
}

/// Direction for graph traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    /// Follow references (papers cited by this paper)
    Forward,
    /// Follow citations (papers citing this paper)
    Backward,
    /// Both directions
    Both,
}
