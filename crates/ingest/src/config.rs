//! Configuration for decoding and parsing inbound FpML content.
//!
//! [`IngestConfig`] bounds the work a single message can cause: payload size,
//! element nesting depth and total node count. Limits are checked before and
//! during parsing so hostile input is rejected instead of exhausting memory.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig {
//!     max_payload_bytes: Some(10 * 1024 * 1024),
//!     ..Default::default()
//! };
//! config.validate().expect("valid ingest config");
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound accepted for [`IngestConfig::max_depth`]. The tree builder and
/// the owned tree's derived `Clone`, `PartialEq` and `Drop` recurse per level,
/// so depth has to stay well inside a worker thread's stack.
pub const MAX_DEPTH_LIMIT: usize = 1024;

/// Runtime limits for the content decoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// Version of the ingest configuration, bumped when decoding behavior changes.
    ///
    /// Default: `1`
    pub version: u32,

    /// Maximum decoded payload size in bytes.
    ///
    /// Checked against the base64 length before decoding and against the
    /// decoded length afterwards.
    ///
    /// Default: `None` (unlimited)
    pub max_payload_bytes: Option<usize>,

    /// Maximum element nesting depth. The root element is depth 1.
    /// Values above [`MAX_DEPTH_LIMIT`] are rejected by [`validate`](Self::validate).
    ///
    /// Default: `256`
    pub max_depth: usize,

    /// Maximum number of XML nodes the parser may allocate.
    ///
    /// Default: `1_000_000`
    pub max_nodes: u32,
}

/// Configuration consistency errors, surfaced at start-up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("max_payload_bytes must be greater than zero when set")]
    ZeroPayloadLimit,
    #[error("max_depth must be greater than zero")]
    ZeroDepth,
    #[error("max_depth must not exceed {max}")]
    DepthTooLarge { max: usize },
    #[error("max_nodes must be greater than zero")]
    ZeroNodes,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            max_payload_bytes: None,
            max_depth: 256,
            max_nodes: 1_000_000,
        }
    }
}

impl IngestConfig {
    /// Check internal consistency. Cheap; call once at start-up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_bytes == Some(0) {
            return Err(ConfigError::ZeroPayloadLimit);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::DepthTooLarge {
                max: MAX_DEPTH_LIMIT,
            });
        }
        if self.max_nodes == 0 {
            return Err(ConfigError::ZeroNodes);
        }
        Ok(())
    }
}
