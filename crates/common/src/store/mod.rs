//! Metadata store abstraction
//!
//! The traversal engine only ever reads from a store. Two implementations
//! are provided:
//! - `InMemoryStore`: a plain ordered map, used by tests and as the backing
//!   map of the journal loader
//! - `JournalDataStore`: loads the pre-fetched `{ISSN}_{year}.json` files

mod journal;
mod venue;

pub use journal::{JournalDataStore, LoadReport};
pub use venue::{common_doi_prefix, VenueIndex};

use crate::models::{PaperId, PaperRecord};
use std::collections::BTreeMap;

/// Read-only lookup of paper records by identifier
pub trait MetadataStore {
    /// Find the record for a paper, `None` when it was never fetched
    fn lookup(&self, id: &PaperId) -> Option<&PaperRecord>;

    /// Number of records held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: &PaperId) -> bool {
        self.lookup(id).is_some()
    }
}

/// Ordered in-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: BTreeMap<PaperId, PaperRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, keeping the first one seen for an identifier.
    ///
    /// Returns `false` when a record with the same id was already present.
    pub fn insert(&mut self, record: PaperRecord) -> bool {
        use std::collections::btree_map::Entry;

        match self.records.entry(record.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(_) => {
                tracing::debug!(paper_id = %record.id, "Duplicate record ignored");
                false
            }
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &PaperRecord> {
        self.records.values()
    }
}

impl FromIterator<PaperRecord> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = PaperRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl MetadataStore for InMemoryStore {
    fn lookup(&self, id: &PaperId) -> Option<&PaperRecord> {
        self.records.get(id)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> PaperId {
        PaperId::parse(raw).unwrap()
    }

    #[test]
    fn test_first_record_wins() {
        let mut store = InMemoryStore::new();
        assert!(store.insert(PaperRecord::new(id("10.1/a")).with_title("first")));
        assert!(!store.insert(PaperRecord::new(id("10.1/A")).with_title("second")));

        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(&id("10.1/a")).unwrap().title, "first");
    }

    #[test]
    fn test_lookup_absent() {
        let store: InMemoryStore = vec![PaperRecord::new(id("10.1/a"))].into_iter().collect();
        assert!(store.contains(&id("10.1/a")));
        assert!(store.lookup(&id("10.1/b")).is_none());
        assert!(!store.is_empty());
    }
}
