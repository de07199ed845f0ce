//! Paper identifiers and records

use crate::errors::{AppError, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Resolver prefixes that carry no identity, stripped before comparison
fn resolver_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:https?://(?:dx\.)?doi\.org/|doi:\s*)").expect("static pattern")
    })
}

/// Normalized persistent identifier (DOI) of a paper.
///
/// Constructed only through [`PaperId::parse`], so two ids compare equal
/// exactly when their normalized forms match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaperId(String);

impl PaperId {
    /// Normalize a raw identifier: trim, drop resolver prefix, lower-case
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let stripped = resolver_prefix().replace(trimmed, "");
        let normalized = stripped.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(AppError::InvalidIdentifier {
                raw: raw.to_string(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Registrant prefix, e.g. `10.1038` for `10.1038/nphys1170`
    pub fn prefix(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PaperId {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<PaperId> for String {
    fn from(id: PaperId) -> Self {
        id.0
    }
}

impl std::str::FromStr for PaperId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Publication year, kept explicit when the source did not provide one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<i32>", into = "Option<i32>")]
pub enum Year {
    Known(i32),
    #[default]
    Unknown,
}

impl Year {
    pub fn value(&self) -> Option<i32> {
        match self {
            Year::Known(y) => Some(*y),
            Year::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Year::Known(_))
    }
}

impl From<Option<i32>> for Year {
    fn from(value: Option<i32>) -> Self {
        value.map(Year::Known).unwrap_or(Year::Unknown)
    }
}

impl From<Year> for Option<i32> {
    fn from(year: Year) -> Self {
        year.value()
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Known(y) => write!(f, "{}", y),
            Year::Unknown => f.write_str("unknown"),
        }
    }
}

/// Locally stored metadata for one paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: PaperId,

    #[serde(default)]
    pub title: String,

    /// Human-readable venue name
    #[serde(default)]
    pub venue: String,

    #[serde(default)]
    pub year: Year,

    /// Cited papers, in the order the source listed them
    #[serde(default)]
    pub references: Vec<PaperId>,
}

impl PaperRecord {
    pub fn new(id: PaperId) -> Self {
        Self {
            id,
            title: String::new(),
            venue: String::new(),
            year: Year::Unknown,
            references: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = venue.into();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Year::Known(year);
        self
    }

    pub fn with_references(mut self, references: Vec<PaperId>) -> Self {
        self.references = references;
        self
    }
}
