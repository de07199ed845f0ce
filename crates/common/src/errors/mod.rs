//! Error types for RefGraph
//!
//! Provides a single error enum shared by the store, the traversal engine
//! and the CLI, with:
//! - Distinct variants for different failure modes
//! - Machine-readable error codes
//! - Process exit code mapping

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors (1xxx)
    ValidationError,
    InvalidIdentifier,

    // Graph integrity errors (2xxx)
    IntegrityError,

    // Store errors (3xxx)
    StoreLoadError,
    SnapshotNotFound,

    // Internal errors (9xxx)
    IoError,
    ConfigurationError,
    SerializationError,
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidIdentifier => 1002,

            ErrorCode::IntegrityError => 2001,

            ErrorCode::StoreLoadError => 3001,
            ErrorCode::SnapshotNotFound => 3002,

            ErrorCode::IoError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::InternalError => 9999,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid paper identifier: {raw:?}")]
    InvalidIdentifier { raw: String },

    /// The visited/missing partition of a traversal was violated
    #[error("Graph integrity violated for {paper_id}: {message}")]
    Integrity { message: String, paper_id: String },

    #[error("Failed to load metadata store from {path}: {message}")]
    StoreLoad { path: String, message: String },

    #[error("Snapshot not found: {path}")]
    SnapshotNotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
            AppError::Integrity { .. } => ErrorCode::IntegrityError,
            AppError::StoreLoad { .. } => ErrorCode::StoreLoadError,
            AppError::SnapshotNotFound { .. } => ErrorCode::SnapshotNotFound,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Errors that point at a bug in the builder rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Integrity { .. } | AppError::Validation { .. })
    }

    /// Check if this error was caused by caller input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidIdentifier { .. } | AppError::SnapshotNotFound { .. }
        )
    }

    /// Process exit status for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::InvalidIdentifier { .. } | AppError::SnapshotNotFound { .. } => 2,
            AppError::Configuration { .. } => 3,
            AppError::StoreLoad { .. } | AppError::Io(_) => 4,
            AppError::Integrity { .. } | AppError::Validation { .. } => 70,
            AppError::Serialization(_) | AppError::Other(_) => 1,
        }
    }

    /// Log this error at a level matching its severity
    pub fn log(&self) {
        let code = self.code();
        if self.is_input_error() {
            tracing::warn!(error = %self, code = ?code, numeric = code.as_code(), "Input error");
        } else {
            tracing::error!(error = %self, code = ?code, numeric = code.as_code(), "Run failed");
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::InvalidIdentifier { raw: "  ".into() };
        assert_eq!(err.code(), ErrorCode::InvalidIdentifier);
        assert_eq!(err.code().as_code(), 1002);
        assert!(err.is_input_error());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_integrity_error_is_fatal() {
        let err = AppError::Integrity {
            message: "visited node has no record".into(),
            paper_id: "10.1/x".into(),
        };
        assert!(err.is_fatal());
        assert!(!err.is_input_error());
        assert_eq!(err.exit_code(), 70);
    }

    #[test]
    fn test_io_error_conversion() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.code(), ErrorCode::IoError);
        assert!(!err.is_fatal());
    }
}
