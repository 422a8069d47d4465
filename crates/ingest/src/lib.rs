//! FpML Ingest Layer
//!
//! This is where a trade-confirmation message enters the pipeline. We take the
//! base64 transport text, turn it into raw bytes, and parse those bytes into an
//! owned XML tree that the validator and extractor can query safely.
//!
//! ## What we do here
//!
//! - **Decode** - base64 to bytes, tolerating line-wrapped transport encoding
//! - **Parse** - well-formedness check with DTDs refused outright, so entity
//!   bombs and external entities never expand
//! - **Strip prefixes** - every element and attribute is stored by local name;
//!   senders may use any prefix they like for the FpML namespace
//! - **Bound the work** - payload size, nesting depth and node count limits
//! - **Query** - [`LocalPath`] is a tiny path language over local names;
//!   "not found" is `None`, never an error
//!
//! Errors are typed ([`IngestError`]) and all of them mean the input itself is
//! malformed.
//!
//! ## Example
//!
//! ```
//! use ingest::{decode, parse, IngestConfig};
//!
//! let cfg = IngestConfig::default();
//! // "<ns:dataDocument xmlns:ns=\"urn:fpml\"><ns:trade/></ns:dataDocument>"
//! let content = "PG5zOmRhdGFEb2N1bWVudCB4bWxuczpucz0idXJuOmZwbWwiPjxuczp0cmFkZS8+PC9uczpkYXRhRG9jdW1lbnQ+";
//!
//! let bytes = decode(content, &cfg).unwrap();
//! let document = parse(&bytes, &cfg).unwrap();
//!
//! assert_eq!(document.root_name(), "dataDocument");
//! assert!(document.contains_element("trade"));
//! ```
use std::time::Instant;

use tracing::{debug, warn};

mod config;
mod decode;
mod document;
mod error;
mod path;
mod types;

pub use crate::config::{ConfigError, IngestConfig, MAX_DEPTH_LIMIT};
pub use crate::document::{Descendants, ParsedDocument, XmlAttribute, XmlElement};
pub use crate::error::{IngestError, QueryError};
pub use crate::path::LocalPath;
pub use crate::types::{IncomingMessage, Priority, ProcessingFlags};

/// Decode base64 transport content into raw bytes.
pub fn decode(content_base64: &str, cfg: &IngestConfig) -> Result<Vec<u8>, IngestError> {
    let start = Instant::now();
    match decode::decode_base64(content_base64, cfg) {
        Ok(bytes) => {
            debug!(
                encoded_len = content_base64.len(),
                decoded_len = bytes.len(),
                elapsed_micros = start.elapsed().as_micros(),
                "fpml_decode_success"
            );
            Ok(bytes)
        }
        Err(err) => {
            warn!(
                encoded_len = content_base64.len(),
                error = %err,
                elapsed_micros = start.elapsed().as_micros(),
                "fpml_decode_failure"
            );
            Err(err)
        }
    }
}

/// Parse decoded bytes into an owned [`ParsedDocument`].
pub fn parse(bytes: &[u8], cfg: &IngestConfig) -> Result<ParsedDocument, IngestError> {
    let start = Instant::now();
    match document::parse_xml(bytes, cfg) {
        Ok(document) => {
            debug!(
                root = %document.root_name(),
                elements = document.element_count(),
                elapsed_micros = start.elapsed().as_micros(),
                "fpml_parse_success"
            );
            Ok(document)
        }
        Err(err) => {
            warn!(
                byte_len = bytes.len(),
                error = %err,
                elapsed_micros = start.elapsed().as_micros(),
                "fpml_parse_failure"
            );
            Err(err)
        }
    }
}

/// Decode and parse the content of an [`IncomingMessage`] in one call.
///
/// Returns the decoded bytes alongside the document so callers can
/// fingerprint exactly what was parsed.
pub fn decode_message(
    message: &IncomingMessage,
    cfg: &IngestConfig,
) -> Result<(Vec<u8>, ParsedDocument), IngestError> {
    let bytes = decode(&message.content_base64, cfg)?;
    let document = parse(&bytes, cfg)?;
    Ok((bytes, document))
}
