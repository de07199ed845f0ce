//! Reference tree builder
//!
//! Level-order expansion from a seed paper. A paper is expanded at most
//! once, at the depth it was first discovered; papers discovered at
//! `max_depth` are kept as nodes but never expanded.

use super::{FrontierNode, TraversalResult};
use refgraph_common::metrics::{self, StageTimer};
use refgraph_common::{MetadataStore, PaperId};
use tracing::{debug, info, warn};

/// Walks references over a read-only store
pub struct ReferenceTreeBuilder<'a, S: MetadataStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MetadataStore + ?Sized> ReferenceTreeBuilder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Expand references from `seed` up to `max_depth` levels
    pub fn build(&self, seed: &PaperId, max_depth: u32) -> TraversalResult {
        let timer = StageTimer::start();
        let mut result = TraversalResult::new(seed.clone(), max_depth);

        if !self.store.contains(seed) {
            warn!(seed = %seed, "Seed paper is not in the local store");
            result.missing.insert(seed.clone());
            metrics::record_traversal(timer.elapsed_secs(), 0, 1);
            return result;
        }

        result
            .visited
            .insert(seed.clone(), FrontierNode::new(seed.clone(), 0));
        let mut frontier = vec![seed.clone()];
        let mut depth = 0;

        while depth < max_depth && !frontier.is_empty() {
            let mut next = Vec::new();

            for citing in &frontier {
                let Some(record) = self.store.lookup(citing) else {
                    continue;
                };

                for cited in &record.references {
                    result.edges.insert((citing.clone(), cited.clone()));

                    if result.visited.contains_key(cited) || result.missing.contains(cited) {
                        continue;
                    }

                    if self.store.contains(cited) {
                        result
                            .visited
                            .insert(cited.clone(), FrontierNode::new(cited.clone(), depth + 1));
                        next.push(cited.clone());
                    } else {
                        result.missing.insert(cited.clone());
                    }
                }
            }

            debug!(
                depth,
                expanded = frontier.len(),
                discovered = next.len(),
                missing = result.missing.len(),
                "Level expanded"
            );

            frontier = next;
            depth += 1;
        }

        let elapsed = timer.elapsed_secs();
        metrics::record_traversal(elapsed, result.visited.len(), result.missing.len());

        info!(
            seed = %seed,
            max_depth,
            visited = result.visited.len(),
            edges = result.edges.len(),
            missing = result.missing.len(),
            elapsed_secs = elapsed,
            "Reference tree built"
        );

        result
    }
}

/// Expand references from `seed` up to `max_depth` levels
pub fn build<S: MetadataStore + ?Sized>(seed: &PaperId, max_depth: u32, store: &S) -> TraversalResult {
    ReferenceTreeBuilder::new(store).build(seed, max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refgraph_common::{InMemoryStore, PaperRecord};
    use std::collections::BTreeSet;

    fn id(raw: &str) -> PaperId {
        PaperId::parse(raw).unwrap()
    }

    fn paper(raw: &str, refs: &[&str]) -> PaperRecord {
        PaperRecord::new(id(raw)).with_references(refs.iter().map(|r| id(r)).collect())
    }

    fn edge(a: &str, b: &str) -> (PaperId, PaperId) {
        (id(a), id(b))
    }

    /// a -> b -> c -> d, a -> c
    fn chain_store() -> InMemoryStore {
        vec![
            paper("10.1/a", &["10.1/b", "10.1/c"]),
            paper("10.1/b", &["10.1/c"]),
            paper("10.1/c", &["10.1/d"]),
            paper("10.1/d", &[]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_zero_depth_leaves_unresolved_references_unseen() {
        let store: InMemoryStore = vec![
            paper("10.1/a", &["10.9/absent", "10.1/b"]),
            paper("10.1/b", &[]),
        ]
        .into_iter()
        .collect();
        let result = build(&id("10.1/a"), 0, &store);

        assert_eq!(result.visited.len(), 1);
        assert!(result.edges.is_empty());
        assert!(result.missing.is_empty());
        result.check_invariants().unwrap();
    }

    #[test]
    fn test_zero_depth_is_seed_only() {
        let store = chain_store();
        let result = build(&id("10.1/a"), 0, &store);

        assert_eq!(result.visited.len(), 1);
        assert_eq!(result.depth_of(&id("10.1/a")), Some(0));
        assert!(result.edges.is_empty());
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_depth_bound() {
        let store = chain_store();
        for max_depth in 0..5 {
            let result = build(&id("10.1/a"), max_depth, &store);
            assert!(result.visited.values().all(|n| n.depth <= max_depth));
            result.check_invariants().unwrap();
        }

        let result = build(&id("10.1/a"), 1, &store);
        let ids: BTreeSet<_> = result.visited.keys().cloned().collect();
        assert_eq!(ids, [id("10.1/a"), id("10.1/b"), id("10.1/c")].into_iter().collect());
        // c is at max depth: recorded but not expanded
        assert!(!result.edges.contains(&edge("10.1/c", "10.1/d")));
        assert!(!result.is_visited(&id("10.1/d")));
    }

    #[test]
    fn test_first_discovery_depth_wins() {
        let store = chain_store();
        let result = build(&id("10.1/a"), 3, &store);

        // c is reachable at depth 1 (a -> c) and depth 2 (a -> b -> c)
        assert_eq!(result.depth_of(&id("10.1/c")), Some(1));
        assert_eq!(result.depth_of(&id("10.1/d")), Some(2));
        assert!(result.edges.contains(&edge("10.1/b", "10.1/c")));
        assert_eq!(result.level_sizes(), vec![1, 2, 1]);
    }

    #[test]
    fn test_cycle_terminates() {
        let store: InMemoryStore = vec![paper("10.1/a", &["10.1/b"]), paper("10.1/b", &["10.1/a"])]
            .into_iter()
            .collect();

        let result = build(&id("10.1/a"), 5, &store);

        let ids: BTreeSet<_> = result.visited.keys().cloned().collect();
        assert_eq!(ids, [id("10.1/a"), id("10.1/b")].into_iter().collect());
        assert_eq!(
            result.edges,
            [edge("10.1/a", "10.1/b"), edge("10.1/b", "10.1/a")].into_iter().collect()
        );
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_missing_references() {
        let store: InMemoryStore = vec![paper("10.1/seed", &["10.9/x", "10.9/y"])].into_iter().collect();

        let result = build(&id("10.1/seed"), 2, &store);

        assert_eq!(result.missing, [id("10.9/x"), id("10.9/y")].into_iter().collect());
        assert_eq!(result.visited.len(), 1);
        assert!(result.edges.contains(&edge("10.1/seed", "10.9/x")));
        result.check_invariants().unwrap();
    }

    #[test]
    fn test_missing_seed() {
        let store = chain_store();
        let result = build(&id("10.1/absent"), 3, &store);

        assert!(result.visited.is_empty());
        assert!(result.edges.is_empty());
        assert_eq!(result.missing, [id("10.1/absent")].into_iter().collect());
    }

    #[test]
    fn test_self_citation() {
        let store: InMemoryStore = vec![paper("10.1/p", &["10.1/p", "10.1/q"]), paper("10.1/q", &[])]
            .into_iter()
            .collect();

        let result = build(&id("10.1/p"), 3, &store);

        assert!(result.edges.contains(&edge("10.1/p", "10.1/p")));
        assert_eq!(result.depth_of(&id("10.1/p")), Some(0));
        assert_eq!(result.visited.len(), 2);
    }

    #[test]
    fn test_duplicate_references_collapse() {
        let store: InMemoryStore = vec![
            paper("10.1/a", &["10.1/b", "10.1/B", " 10.1/b "]),
            paper("10.1/b", &[]),
        ]
        .into_iter()
        .collect();

        let result = build(&id("10.1/a"), 1, &store);
        assert_eq!(result.edges.len(), 1);
    }

    #[test]
    fn test_builder_over_trait_object() {
        let store = chain_store();
        let dyn_store: &dyn MetadataStore = &store;
        let result = ReferenceTreeBuilder::new(dyn_store).build(&id("10.1/b"), 1);
        assert_eq!(result.visited.len(), 2);
    }
}
