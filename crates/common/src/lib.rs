//! RefGraph Common Library
//!
//! Shared code for the RefGraph workspace including:
//! - Paper identifiers and records
//! - The read-only metadata store and journal data loader
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, ErrorCode, Result};
pub use models::{PaperId, PaperRecord, Year};
pub use store::{InMemoryStore, JournalDataStore, MetadataStore, VenueIndex};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
