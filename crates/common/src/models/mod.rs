//! Core data model
//!
//! Identifiers and immutable paper records shared by the store and the
//! traversal engine.

mod paper;

pub use paper::{PaperId, PaperRecord, Year};
