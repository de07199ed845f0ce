//! Configuration management for RefGraph
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use crate::errors::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Deepest traversal the configuration accepts
pub const MAX_TRAVERSAL_DEPTH: u32 = 10;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    /// Local metadata store
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,

    /// Traversal and assembly settings
    #[serde(default)]
    #[validate(nested)]
    pub traversal: TraversalConfig,

    /// Snapshot output
    #[serde(default)]
    #[validate(nested)]
    pub output: OutputConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StoreConfig {
    /// Directory holding `{ISSN}_{year}.json` files
    #[serde(default = "default_data_dir")]
    #[validate(custom(function = "non_empty_path"))]
    pub data_dir: PathBuf,

    /// Optional ISSN -> venue name dictionary
    pub venue_names_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TraversalConfig {
    /// Default depth when the caller does not give one
    #[serde(default = "default_max_depth")]
    #[validate(range(max = MAX_TRAVERSAL_DEPTH))]
    pub max_depth: u32,

    /// Keep edges from a paper to itself
    #[serde(default = "default_retain_self_loops")]
    pub retain_self_loops: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct OutputConfig {
    /// Where snapshots are written
    #[serde(default = "default_output_dir")]
    #[validate(custom(function = "non_empty_path"))]
    pub dir: PathBuf,

    /// Pretty-print snapshot JSON
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Venues listed after a build
    #[serde(default = "default_top_venues")]
    #[validate(range(min = 1, max = 1000))]
    pub top_venues: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,

    /// Service name attached to log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_data_dir() -> PathBuf { PathBuf::from("journal_data") }
fn default_max_depth() -> u32 { 2 }
fn default_retain_self_loops() -> bool { true }
fn default_output_dir() -> PathBuf { PathBuf::from("graphs") }
fn default_pretty() -> bool { true }
fn default_top_venues() -> usize { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "refgraph".to_string() }

fn non_empty_path(path: &PathBuf) -> std::result::Result<(), validator::ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(validator::ValidationError::new("empty_path"));
    }
    Ok(())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            venue_names_file: None,
        }
    }
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            retain_self_loops: default_retain_self_loops(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            pretty: default_pretty(),
            top_venues: default_top_venues(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: 0,
            service_name: default_service_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            traversal: TraversalConfig::default(),
            output: OutputConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__TRAVERSAL__MAX_DEPTH=3
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.traversal.max_depth, 2);
        assert!(config.traversal.retain_self_loops);
        assert_eq!(config.store.data_dir, PathBuf::from("journal_data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_depth_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.traversal.max_depth = MAX_TRAVERSAL_DEPTH + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_depth_at_limit_accepted() {
        let mut config = AppConfig::default();
        config.traversal.max_depth = MAX_TRAVERSAL_DEPTH;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_output_dir_rejected() {
        let mut config = AppConfig::default();
        config.output.dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refgraph.toml");
        std::fs::write(
            &path,
            "[traversal]\nmax_depth = 4\nretain_self_loops = false\n\n[store]\ndata_dir = \"data\"\n",
        )
        .unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.traversal.max_depth, 4);
        assert!(!config.traversal.retain_self_loops);
        assert_eq!(config.store.data_dir, PathBuf::from("data"));
        assert_eq!(config.output.top_venues, 10);
    }
}
