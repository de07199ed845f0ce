//! Venue lookups
//!
//! Maps a venue registry code (ISSN) to its human-readable name and to the
//! DOI prefix shared by the papers published there. The prefix table is
//! derived in memory from loaded records and never written back.

use crate::errors::{AppError, Result};
use crate::models::PaperId;
use std::collections::BTreeMap;
use std::path::Path;

/// Read-only venue dictionaries
#[derive(Debug, Clone, Default)]
pub struct VenueIndex {
    /// ISSN -> venue name
    names: BTreeMap<String, String>,

    /// ISSN -> common DOI prefix of its papers
    prefixes: BTreeMap<String, String>,
}

impl VenueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names(names: BTreeMap<String, String>) -> Self {
        Self {
            names,
            prefixes: BTreeMap::new(),
        }
    }

    /// Read an ISSN -> name JSON object from disk
    pub async fn load_names(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::StoreLoad {
                path: path.display().to_string(),
                message: format!("Failed to read venue dictionary: {}", e),
            })?;

        let names: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), venues = names.len(), "Venue dictionary loaded");

        Ok(Self::with_names(names))
    }

    pub fn set_prefix(&mut self, issn: impl Into<String>, prefix: impl Into<String>) {
        self.prefixes.insert(issn.into(), prefix.into());
    }

    pub fn name(&self, issn: &str) -> Option<&str> {
        self.names.get(issn).map(String::as_str)
    }

    /// Venue name, or the ISSN itself when the dictionary has no entry
    pub fn display_name(&self, issn: &str) -> String {
        self.name(issn).unwrap_or(issn).to_string()
    }

    pub fn prefix(&self, issn: &str) -> Option<&str> {
        self.prefixes.get(issn).map(String::as_str)
    }

    /// Attribute a paper to a venue by longest matching DOI prefix.
    ///
    /// Only prefixes under the paper's own registrant are considered.
    pub fn venue_for(&self, id: &PaperId) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, prefix)| registrant(prefix) == Some(id.prefix()))
            .filter(|(_, prefix)| id.as_str().starts_with(prefix.as_str()))
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(issn, _)| self.display_name(issn))
    }

    pub fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }
}

/// Registrant part of a prefix, `None` unless the prefix spans the `/`
fn registrant(prefix: &str) -> Option<&str> {
    prefix.split_once('/').map(|(registrant, _)| registrant)
}

/// Longest common prefix of a set of DOIs.
///
/// `None` when the DOIs do not share a full registrant prefix (`10.1038/`).
pub fn common_doi_prefix<'a, I>(dois: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut iter = dois.into_iter();
    let mut prefix = iter.next()?.to_string();

    for doi in iter {
        let shared = prefix
            .char_indices()
            .zip(doi.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((idx, c), _)| idx + c.len_utf8())
            .unwrap_or(0);
        prefix.truncate(shared);

        if registrant(&prefix).is_none() {
            return None;
        }
    }

    registrant(&prefix)?;
    Some(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefix() {
        let dois = ["10.1038/nphys1170", "10.1038/nphys2004", "10.1038/nphys3001"];
        assert_eq!(common_doi_prefix(dois.iter().copied()).as_deref(), Some("10.1038/nphys"));
    }

    #[test]
    fn test_common_prefix_single_and_disjoint() {
        assert_eq!(common_doi_prefix(["10.1/a"]).as_deref(), Some("10.1/a"));
        assert_eq!(common_doi_prefix(["10.1/a", "11.2/b"]), None);
        assert_eq!(common_doi_prefix(["10.1038/nphys1", "10.1103/physrevlett.2"]), None);
        assert_eq!(common_doi_prefix(["noslash"]), None);
        assert_eq!(common_doi_prefix(std::iter::empty()), None);
    }

    #[test]
    fn test_venue_for_prefers_longest_prefix() {
        let mut names = BTreeMap::new();
        names.insert("1745-2473".to_string(), "Nature Physics".to_string());
        names.insert("0028-0836".to_string(), "Nature".to_string());

        let mut index = VenueIndex::with_names(names);
        index.set_prefix("0028-0836", "10.1038/");
        index.set_prefix("1745-2473", "10.1038/nphys");

        let id = PaperId::parse("10.1038/nphys1170").unwrap();
        assert_eq!(index.venue_for(&id).as_deref(), Some("Nature Physics"));

        let id = PaperId::parse("10.1038/nature12345").unwrap();
        assert_eq!(index.venue_for(&id).as_deref(), Some("Nature"));

        let id = PaperId::parse("10.1103/physrevlett.1").unwrap();
        assert_eq!(index.venue_for(&id), None);
    }

    #[test]
    fn test_mixed_registrant_venue_claims_nothing_foreign() {
        let mut index = VenueIndex::new();
        let dois = ["10.1038/nphys1170", "10.1103/physrevlett.116.061102"];
        if let Some(prefix) = common_doi_prefix(dois) {
            index.set_prefix("0000-0001", prefix);
        }
        assert_eq!(index.prefix("0000-0001"), None);

        // A hand-set prefix cut inside the registrant is ignored too
        index.set_prefix("0000-0002", "10.1");
        index.set_prefix("0031-9007", "10.1103/physrevlett");

        let foreign = PaperId::parse("10.1126/science.1").unwrap();
        assert_eq!(index.venue_for(&foreign), None);

        let prl = PaperId::parse("10.1103/PhysRevLett.9").unwrap();
        assert_eq!(index.venue_for(&prl).as_deref(), Some("0031-9007"));
    }

    #[test]
    fn test_display_name_falls_back_to_issn() {
        let index = VenueIndex::new();
        assert_eq!(index.display_name("2399-3650"), "2399-3650");
    }

    #[tokio::test]
    async fn test_load_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venues.json");
        std::fs::write(&path, r#"{"2399-3650": "Communications Physics"}"#).unwrap();

        let index = VenueIndex::load_names(&path).await.unwrap();
        assert_eq!(index.name("2399-3650"), Some("Communications Physics"));
    }
}
