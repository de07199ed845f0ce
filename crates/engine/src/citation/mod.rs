//! Reference tree construction
//!
//! Bounded breadth-first expansion over the local metadata store, followed
//! by assembly into a directed citation graph:
//! - `builder`: walks references level by level, tracking the missing set
//! - `assembler`: attaches metadata and validates the visited/missing split
//! - `graph`: the resulting citation graph and its queries

mod assembler;
mod builder;
mod graph;

pub use assembler::{assemble, AssemblerConfig, GraphAssembler};
pub use builder::{build, ReferenceTreeBuilder};
pub use graph::{CitationGraph, PaperNode, TraversalDirection};

use refgraph_common::errors::{AppError, Result};
use refgraph_common::PaperId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A paper together with the depth it was first discovered at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontierNode {
    pub id: PaperId,

    /// Seed is depth 0
    pub depth: u32,
}

impl FrontierNode {
    pub fn new(id: PaperId, depth: u32) -> Self {
        Self { id, depth }
    }
}

/// Outcome of one reference tree traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalResult {
    pub seed: PaperId,

    pub max_depth: u32,

    /// Resolvable papers, keyed by id, with first-discovery depth
    pub visited: BTreeMap<PaperId, FrontierNode>,

    /// (citing, cited) pairs
    pub edges: BTreeSet<(PaperId, PaperId)>,

    /// Referenced papers that the store has no record for
    pub missing: BTreeSet<PaperId>,
}

impl TraversalResult {
    pub fn new(seed: PaperId, max_depth: u32) -> Self {
        Self {
            seed,
            max_depth,
            visited: BTreeMap::new(),
            edges: BTreeSet::new(),
            missing: BTreeSet::new(),
        }
    }

    pub fn depth_of(&self, id: &PaperId) -> Option<u32> {
        self.visited.get(id).map(|node| node.depth)
    }

    pub fn is_visited(&self, id: &PaperId) -> bool {
        self.visited.contains_key(id)
    }

    /// Papers first discovered at `depth`, in id order
    pub fn nodes_at_depth(&self, depth: u32) -> Vec<&PaperId> {
        self.visited
            .values()
            .filter(|node| node.depth == depth)
            .map(|node| &node.id)
            .collect()
    }

    /// Number of visited papers per depth, index = depth
    pub fn level_sizes(&self) -> Vec<usize> {
        let deepest = self.visited.values().map(|n| n.depth).max();
        let Some(deepest) = deepest else {
            return Vec::new();
        };

        let mut sizes = vec![0; deepest as usize + 1];
        for node in self.visited.values() {
            sizes[node.depth as usize] += 1;
        }
        sizes
    }

    /// Verify the visited/missing partition and the depth bound
    pub fn check_invariants(&self) -> Result<()> {
        if let Some(id) = self.visited.keys().find(|id| self.missing.contains(*id)) {
            return Err(AppError::Integrity {
                message: "paper is both visited and missing".to_string(),
                paper_id: id.to_string(),
            });
        }

        if let Some(node) = self.visited.values().find(|n| n.depth > self.max_depth) {
            return Err(AppError::Integrity {
                message: format!("discovered at depth {} beyond limit {}", node.depth, self.max_depth),
                paper_id: node.id.to_string(),
            });
        }

        for (citing, cited) in &self.edges {
            if !self.is_visited(citing) {
                return Err(AppError::Validation {
                    message: format!("citing paper {} of edge to {} was never visited", citing, cited),
                    field: Some("edges".to_string()),
                });
            }
            if !self.is_visited(cited) && !self.missing.contains(cited) {
                return Err(AppError::Validation {
                    message: format!("cited paper {} is neither visited nor missing", cited),
                    field: Some("edges".to_string()),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> PaperId {
        PaperId::parse(raw).unwrap()
    }

    #[test]
    fn test_level_sizes() {
        let mut result = TraversalResult::new(id("10.1/a"), 2);
        result.visited.insert(id("10.1/a"), FrontierNode::new(id("10.1/a"), 0));
        result.visited.insert(id("10.1/b"), FrontierNode::new(id("10.1/b"), 1));
        result.visited.insert(id("10.1/c"), FrontierNode::new(id("10.1/c"), 1));

        assert_eq!(result.level_sizes(), vec![1, 2]);
        assert_eq!(result.nodes_at_depth(1), vec![&id("10.1/b"), &id("10.1/c")]);
        assert_eq!(result.depth_of(&id("10.1/c")), Some(1));
        assert_eq!(result.depth_of(&id("10.1/z")), None);
    }

    #[test]
    fn test_invariants_reject_overlap() {
        let mut result = TraversalResult::new(id("10.1/a"), 1);
        result.visited.insert(id("10.1/a"), FrontierNode::new(id("10.1/a"), 0));
        result.missing.insert(id("10.1/a"));

        let err = result.check_invariants().unwrap_err();
        assert!(matches!(err, AppError::Integrity { .. }));
    }

    #[test]
    fn test_invariants_reject_untracked_edge() {
        let mut result = TraversalResult::new(id("10.1/a"), 1);
        result.visited.insert(id("10.1/a"), FrontierNode::new(id("10.1/a"), 0));
        result.edges.insert((id("10.1/a"), id("10.1/ghost")));

        let err = result.check_invariants().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
