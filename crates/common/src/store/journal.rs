//! Journal data directory loader
//!
//! The bulk fetcher leaves one JSON file per venue and year, named
//! `{ISSN}_{year}.json`, each holding
//! `{doi: {"info": {"title": .., "year": ..}, "references": [doi, ..]}}`.
//! Loading is lenient: a bad record or file is counted and skipped, only an
//! unreadable directory fails the load.

use super::{common_doi_prefix, InMemoryStore, MetadataStore, VenueIndex};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::models::{PaperId, PaperRecord, Year};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters collected while loading a data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub files_read: usize,
    pub files_skipped: usize,
    pub records_loaded: usize,
    pub duplicate_records: usize,
    pub rejected_keys: usize,
    pub rejected_references: usize,
}

/// Store backed by the pre-fetched journal data files
#[derive(Debug, Clone)]
pub struct JournalDataStore {
    records: InMemoryStore,
    venues: VenueIndex,
    report: LoadReport,
}

/// Venue code and year encoded in a data file name
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileKey {
    issn: String,
    year: Option<i32>,
}

impl FileKey {
    fn from_path(path: &Path) -> Option<Self> {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let (issn, year) = stem.rsplit_once('_')?;
        if issn.is_empty() {
            return None;
        }

        Some(Self {
            issn: issn.to_string(),
            year: year.parse().ok(),
        })
    }
}

impl JournalDataStore {
    /// Load every `{ISSN}_{year}.json` file under `data_dir`
    pub async fn load(data_dir: &Path, venues: VenueIndex) -> Result<Self> {
        let start = Instant::now();
        let paths = list_data_files(data_dir).await?;

        let mut store = Self {
            records: InMemoryStore::new(),
            venues,
            report: LoadReport::default(),
        };
        let mut dois_by_issn: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for path in paths {
            let Some(key) = FileKey::from_path(&path) else {
                debug!(path = %path.display(), "Not a journal data file, skipping");
                continue;
            };

            let entries = match read_data_file(&path).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable data file");
                    store.report.files_skipped += 1;
                    continue;
                }
            };
            store.report.files_read += 1;

            let venue = store.venues.display_name(&key.issn);
            for (raw_id, value) in &entries {
                let (record, rejected) = match parse_record(raw_id, value, &key, &venue) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping record");
                        store.report.rejected_keys += 1;
                        continue;
                    }
                };

                let doi = record.id.as_str().to_string();
                if store.records.insert(record) {
                    store.report.records_loaded += 1;
                    store.report.rejected_references += rejected;
                    dois_by_issn.entry(key.issn.clone()).or_default().push(doi);
                } else {
                    store.report.duplicate_records += 1;
                }
            }
        }

        for (issn, dois) in &dois_by_issn {
            if let Some(prefix) = common_doi_prefix(dois.iter().map(String::as_str)) {
                store.venues.set_prefix(issn.clone(), prefix);
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_store_load(elapsed, &store.report);

        info!(
            data_dir = %data_dir.display(),
            files = store.report.files_read,
            skipped = store.report.files_skipped,
            records = store.report.records_loaded,
            duplicates = store.report.duplicate_records,
            elapsed_secs = elapsed,
            "Journal data loaded"
        );

        Ok(store)
    }

    pub fn venues(&self) -> &VenueIndex {
        &self.venues
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn records(&self) -> impl Iterator<Item = &PaperRecord> {
        self.records.records()
    }
}

impl MetadataStore for JournalDataStore {
    fn lookup(&self, id: &PaperId) -> Option<&PaperRecord> {
        self.records.lookup(id)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Build a record from one `doi -> {...}` entry, with its count of
/// references that failed normalization
fn parse_record(raw_id: &str, value: &Value, key: &FileKey, venue: &str) -> Result<(PaperRecord, usize)> {
    let id = PaperId::parse(raw_id)?;
    let info = value.get("info");

    let title = info
        .and_then(|i| i.get("title"))
        .and_then(|t| match t {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .unwrap_or_default();

    let year = info
        .and_then(|i| i.get("year"))
        .and_then(Value::as_i64)
        .and_then(|y| i32::try_from(y).ok())
        .or(key.year);

    let mut references = Vec::new();
    let mut rejected = 0;
    match value.get("references") {
        Some(Value::Array(items)) => {
            for item in items {
                // Crossref-style entries carry the DOI in an object
                let raw = match item {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(obj) => obj.get("DOI").and_then(Value::as_str),
                    _ => None,
                };
                match raw.map(PaperId::parse) {
                    Some(Ok(reference)) => references.push(reference),
                    _ => rejected += 1,
                }
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => {
            debug!(paper_id = %id, kind = %json_kind(other), "Malformed reference list treated as empty");
        }
    }

    let record = PaperRecord {
        id,
        title,
        venue: venue.to_string(),
        year: Year::from(year),
        references,
    };
    Ok((record, rejected))
}

/// Sorted list of files in the data directory
async fn list_data_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let store_err = |e: std::io::Error| AppError::StoreLoad {
        path: data_dir.display().to_string(),
        message: e.to_string(),
    };

    let mut dir = tokio::fs::read_dir(data_dir).await.map_err(store_err)?;
    let mut paths = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(store_err)? {
        if entry.file_type().await.map_err(store_err)?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    Ok(paths)
}

async fn read_data_file(path: &Path) -> Result<Map<String, Value>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let entries: Map<String, Value> = serde_json::from_str(&raw)?;
    Ok(entries)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
