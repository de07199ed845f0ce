//! Graph assembly
//!
//! Turns a finished traversal into a `CitationGraph`. Missing papers stay
//! out of the node set and are carried alongside it.

use super::{CitationGraph, PaperNode, TraversalResult};
use refgraph_common::config::TraversalConfig;
use refgraph_common::errors::{AppError, Result};
use refgraph_common::metrics::{self, StageTimer};
use refgraph_common::MetadataStore;
use tracing::{debug, error, info};

/// Assembly policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Keep edges from a paper to itself
    pub retain_self_loops: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            retain_self_loops: true,
        }
    }
}

impl From<&TraversalConfig> for AssemblerConfig {
    fn from(config: &TraversalConfig) -> Self {
        Self {
            retain_self_loops: config.retain_self_loops,
        }
    }
}

/// Builds citation graphs from traversal results
#[derive(Debug, Clone, Default)]
pub struct GraphAssembler {
    config: AssemblerConfig,
}

impl GraphAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Assemble the graph, failing on any visited/missing inconsistency
    pub fn assemble<S: MetadataStore + ?Sized>(
        &self,
        result: &TraversalResult,
        store: &S,
    ) -> Result<CitationGraph> {
        let timer = StageTimer::start();
        let outcome = self.assemble_inner(result, store);
        metrics::record_assembly(timer.elapsed_secs(), outcome.is_ok());

        match &outcome {
            Ok(graph) => info!(
                seed = %graph.seed(),
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                missing = graph.missing().len(),
                frontier_citations = graph.frontier_citations(),
                "Citation graph assembled"
            ),
            Err(e) => error!(seed = %result.seed, error = %e, "Citation graph assembly failed"),
        }

        outcome
    }

    fn assemble_inner<S: MetadataStore + ?Sized>(
        &self,
        result: &TraversalResult,
        store: &S,
    ) -> Result<CitationGraph> {
        let mut graph = CitationGraph::new(result.seed.clone(), result.max_depth);

        for (id, frontier) in &result.visited {
            if result.missing.contains(id) {
                return Err(AppError::Integrity {
                    message: "paper is both visited and missing".to_string(),
                    paper_id: id.to_string(),
                });
            }

            let record = store.lookup(id).ok_or_else(|| AppError::Integrity {
                message: "visited paper has no record in the store".to_string(),
                paper_id: id.to_string(),
            })?;

            graph.add_node(PaperNode::from_record(record, frontier.depth));
        }

        let mut dropped_self_loops = 0usize;
        for (citing, cited) in &result.edges {
            if !result.is_visited(citing) {
                if result.missing.contains(citing) {
                    return Err(AppError::Integrity {
                        message: format!("missing paper has an outgoing citation to {}", cited),
                        paper_id: citing.to_string(),
                    });
                }
                return Err(AppError::Validation {
                    message: format!("citing paper {} is neither visited nor missing", citing),
                    field: Some("edges".to_string()),
                });
            }

            if result.missing.contains(cited) {
                graph.add_frontier_citation();
                continue;
            }

            if !result.is_visited(cited) {
                return Err(AppError::Validation {
                    message: format!("cited paper {} is neither visited nor missing", cited),
                    field: Some("edges".to_string()),
                });
            }

            if citing == cited && !self.config.retain_self_loops {
                dropped_self_loops += 1;
                continue;
            }

            graph.add_edge(citing, cited)?;
        }

        if dropped_self_loops > 0 {
            debug!(dropped_self_loops, "Self-citations filtered");
        }

        graph.set_missing(result.missing.clone());
        Ok(graph)
    }
}

/// Assemble with the default policy (self-loops retained)
pub fn assemble<S: MetadataStore + ?Sized>(result: &TraversalResult, store: &S) -> Result<CitationGraph> {
    GraphAssembler::default().assemble(result, store)
}
