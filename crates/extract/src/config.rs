//! Configuration for trade data extraction.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ISO 17442 coding scheme used by FpML to mark LEI party identifiers.
pub const ISO_17442_SCHEME: &str = "http://www.fpml.org/coding-scheme/external/iso17442";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractConfig {
    /// Default: `1`
    pub version: u32,

    /// `partyIdScheme` value that identifies a party's LEI.
    ///
    /// Default: [`ISO_17442_SCHEME`]
    pub lei_scheme: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("extract.version must be >= 1")]
    InvalidVersion,
    #[error("lei_scheme must not be empty")]
    EmptyLeiScheme,
    #[error("lei_scheme cannot contain both single and double quotes")]
    UnquotableLeiScheme,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            version: 1,
            lei_scheme: ISO_17442_SCHEME.to_string(),
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::InvalidVersion);
        }
        if self.lei_scheme.trim().is_empty() {
            return Err(ConfigError::EmptyLeiScheme);
        }
        if self.lei_scheme.contains('\'') && self.lei_scheme.contains('"') {
            return Err(ConfigError::UnquotableLeiScheme);
        }
        Ok(())
    }
}
