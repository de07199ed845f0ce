//! Venue popularity
//!
//! Pure functions over a finished graph (or its snapshot) that rank venues
//! by how much of the unresolved frontier they would cover if fetched next.

use crate::citation::{CitationGraph, PaperNode};
use refgraph_common::{PaperId, VenueIndex};
use serde::Serialize;
use std::collections::BTreeMap;

/// Bucket for nodes stored without a venue
pub const UNKNOWN_VENUE: &str = "Unknown";

/// Per-venue counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueScore {
    pub venue: String,

    /// Graph nodes published in this venue
    pub nodes: usize,

    /// Missing papers attributed to this venue by DOI prefix
    pub missing: usize,
}

/// Ranked venues plus the missing papers no venue could claim.
///
/// Unclaimed missing papers are also counted in the `Unknown` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueRanking {
    pub venues: Vec<VenueScore>,
    pub unattributed: usize,
}

impl VenueRanking {
    /// Venue to fetch next, if any missing paper could be attributed
    pub fn next_fetch(&self) -> Option<&VenueScore> {
        self.venues
            .iter()
            .find(|score| score.venue != UNKNOWN_VENUE)
            .filter(|score| score.missing > 0)
    }
}

/// Count nodes per venue
pub fn venue_frequencies<'a, I>(nodes: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a PaperNode>,
{
    let mut counts = BTreeMap::new();
    for node in nodes {
        *counts.entry(venue_label(&node.venue).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Venue counts over the graph's leaves
pub fn leaf_venue_frequencies(graph: &CitationGraph) -> BTreeMap<String, usize> {
    venue_frequencies(graph.leaves())
}

/// Rank venues from node venues and the missing set.
///
/// Ordered by missing count, then node count (both descending), then name.
pub fn rank_venues<'a, N, M>(node_venues: N, missing: M, index: &VenueIndex, limit: usize) -> VenueRanking
where
    N: IntoIterator<Item = &'a str>,
    M: IntoIterator<Item = &'a PaperId>,
{
    let mut scores: BTreeMap<String, VenueScore> = BTreeMap::new();

    for venue in node_venues {
        let venue = venue_label(venue);
        scores
            .entry(venue.to_string())
            .or_insert_with(|| VenueScore::empty(venue))
            .nodes += 1;
    }

    let mut unattributed = 0;
    for id in missing {
        match index.venue_for(id) {
            Some(venue) => {
                scores
                    .entry(venue.clone())
                    .or_insert_with(|| VenueScore::empty(&venue))
                    .missing += 1;
            }
            None => {
                scores
                    .entry(UNKNOWN_VENUE.to_string())
                    .or_insert_with(|| VenueScore::empty(UNKNOWN_VENUE))
                    .missing += 1;
                unattributed += 1;
            }
        }
    }

    let mut venues: Vec<VenueScore> = scores.into_values().collect();
    venues.sort_by(|a, b| {
        b.missing
            .cmp(&a.missing)
            .then_with(|| b.nodes.cmp(&a.nodes))
            .then_with(|| a.venue.cmp(&b.venue))
    });
    venues.truncate(limit);

    VenueRanking {
        venues,
        unattributed,
    }
}

/// Rank venues for an assembled graph
pub fn rank_graph_venues(graph: &CitationGraph, index: &VenueIndex, limit: usize) -> VenueRanking {
    rank_venues(
        graph.nodes().map(|node| node.venue.as_str()),
        graph.missing(),
        index,
        limit,
    )
}

impl VenueScore {
    fn empty(venue: &str) -> Self {
        Self {
            venue: venue.to_string(),
            nodes: 0,
            missing: 0,
        }
    }
}

fn venue_label(venue: &str) -> &str {
    if venue.trim().is_empty() {
        UNKNOWN_VENUE
    } else {
        venue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::{assemble, build};
    use refgraph_common::{InMemoryStore, PaperRecord};

    fn id(raw: &str) -> PaperId {
        PaperId::parse(raw).unwrap()
    }

    fn index() -> VenueIndex {
        let mut names = BTreeMap::new();
        names.insert("1745-2473".to_string(), "Nature Physics".to_string());
        names.insert("0031-9007".to_string(), "Physical Review Letters".to_string());

        let mut index = VenueIndex::with_names(names);
        index.set_prefix("1745-2473", "10.1038/nphys");
        index.set_prefix("0031-9007", "10.1103/physrevlett");
        index
    }

    #[test]
    fn test_rank_orders_by_missing_then_nodes() {
        let missing = [
            id("10.1103/PhysRevLett.1"),
            id("10.1103/PhysRevLett.2"),
            id("10.1038/nphys9"),
            id("10.9999/unknown"),
        ];
        let nodes = ["Nature Physics", "Nature Physics", "Science", ""];

        let ranking = rank_venues(nodes.iter().copied(), missing.iter(), &index(), 10);

        let names: Vec<_> = ranking.venues.iter().map(|v| v.venue.as_str()).collect();
        assert_eq!(names, vec!["Physical Review Letters", "Nature Physics", "Unknown", "Science"]);
        assert_eq!(ranking.venues[0].missing, 2);
        assert_eq!(ranking.venues[1].nodes, 2);
        assert_eq!(ranking.venues[2].missing, 1);
        assert_eq!(ranking.venues[2].nodes, 1);
        assert_eq!(ranking.unattributed, 1);
        assert_eq!(ranking.next_fetch().unwrap().venue, "Physical Review Letters");
    }

    #[test]
    fn test_rank_limit_and_no_fetch_candidate() {
        let nodes = ["Science", "Nature"];
        let ranking = rank_venues(nodes.iter().copied(), std::iter::empty(), &index(), 1);

        assert_eq!(ranking.venues.len(), 1);
        assert_eq!(ranking.venues[0].venue, "Nature");
        assert!(ranking.next_fetch().is_none());
    }

    #[test]
    fn test_unclaimed_missing_counted_as_unknown() {
        let missing = [id("10.9999/x"), id("10.9999/y")];
        let ranking = rank_venues(["Nature"].iter().copied(), missing.iter(), &VenueIndex::new(), 10);

        assert_eq!(
            ranking.venues,
            vec![
                VenueScore {
                    venue: UNKNOWN_VENUE.to_string(),
                    nodes: 0,
                    missing: 2,
                },
                VenueScore {
                    venue: "Nature".to_string(),
                    nodes: 1,
                    missing: 0,
                },
            ]
        );
        assert_eq!(ranking.unattributed, 2);
        // Unknown is never a fetch target
        assert!(ranking.next_fetch().is_none());
    }

    #[test]
    fn test_rank_graph_and_leaf_frequencies() {
        let store: InMemoryStore = vec![
            PaperRecord::new(id("10.1038/nphys1"))
                .with_venue("Nature Physics")
                .with_references(vec![id("10.1038/nphys2"), id("10.1103/physrevlett.7")]),
            PaperRecord::new(id("10.1038/nphys2")).with_venue("Nature Physics"),
        ]
        .into_iter()
        .collect();

        let graph = assemble(&build(&id("10.1038/nphys1"), 2, &store), &store).unwrap();
        let ranking = rank_graph_venues(&graph, &index(), 5);

        assert_eq!(ranking.venues.len(), 2);
        assert_eq!(ranking.venues[0].venue, "Physical Review Letters");
        assert_eq!(ranking.venues[0].missing, 1);
        assert_eq!(ranking.venues[1].nodes, 2);

        let leaves = leaf_venue_frequencies(&graph);
        assert_eq!(leaves.get("Nature Physics"), Some(&1));
    }
}
