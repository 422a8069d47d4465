//! YAML configuration for the intake pipeline.
//!
//! Every stage has its own section; anything omitted falls back to that
//! stage's defaults, so an empty document apart from `version` is valid.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "confirmations-eu"
//! max_concurrency: 16
//!
//! ingest:
//!   version: 1
//!   max_payload_bytes: 10485760
//!   max_depth: 256
//!   max_nodes: 1000000
//!
//! extract:
//!   version: 1
//!   lei_scheme: "http://www.fpml.org/coding-scheme/external/iso17442"
//!
//! dedup:
//!   version: 1
//!   enabled: true
//!   lookup_timeout_ms: 250
//!   window_secs: 86400
//! ```

use std::fs;
use std::path::Path;

use dedup::DedupConfig;
use extract::ExtractConfig;
use ingest::IngestConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    /// Messages in flight at once during [`crate::Pipeline::process_batch`].
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl PipelineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.ingest
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("ingest: {err}")))?;
        self.extract
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("extract: {err}")))?;
        self.dedup
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("dedup: {err}")))?;

        if self.max_concurrency == 0 {
            return Err(ConfigLoadError::Validation(
                "max_concurrency must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            ingest: IngestConfig::default(),
            extract: ExtractConfig::default(),
            dedup: DedupConfig::default(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
fn default_max_concurrency() -> usize {
    8
}
