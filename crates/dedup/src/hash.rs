//! Content fingerprints.
//!
//! ```text
//! fingerprint = hex(SHA-256(decoded_bytes))
//! ```
//!
//! The digest covers the decoded payload, never the base64 transport text,
//! so re-wrapping or re-padding the transport encoding leaves the
//! fingerprint unchanged.
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the decoded message bytes (64 characters).
///
/// ```rust
/// use dedup::fingerprint;
///
/// let fp = fingerprint(b"<dataDocument/>");
/// assert_eq!(fp.len(), 64);
/// assert_eq!(fp, fingerprint(b"<dataDocument/>"));
/// ```
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
