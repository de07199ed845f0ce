//! RefGraph Engine
//!
//! Builds a citation graph outward from one seed paper over the local
//! metadata store:
//! - Bounded breadth-first reference traversal with a missing-paper frontier
//! - Graph assembly with metadata and integrity checks
//! - Venue popularity ranking over the unresolved frontier
//! - Immutable JSON snapshots for the next pipeline stage

pub mod citation;
pub mod popularity;
pub mod snapshot;

pub use citation::{
    AssemblerConfig, CitationGraph, FrontierNode, GraphAssembler, PaperNode, ReferenceTreeBuilder,
    TraversalDirection, TraversalResult,
};
pub use popularity::{rank_graph_venues, rank_venues, VenueRanking, VenueScore};
pub use snapshot::GraphSnapshot;

use refgraph_common::errors::Result;
use refgraph_common::{MetadataStore, PaperId};

/// Traverse from `seed` and assemble the resulting graph
pub fn build_citation_graph<S: MetadataStore + ?Sized>(
    seed: &PaperId,
    max_depth: u32,
    store: &S,
    config: AssemblerConfig,
) -> Result<CitationGraph> {
    let result = ReferenceTreeBuilder::new(store).build(seed, max_depth);
    GraphAssembler::new(config).assemble(&result, store)
}
