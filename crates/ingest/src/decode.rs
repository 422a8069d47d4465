//! Transport decoding: base64 text to raw bytes.
//!
//! Senders frequently wrap base64 at 64 or 76 columns, so ASCII whitespace is
//! removed before decoding. The decoded bytes (not the base64 text) are what
//! gets fingerprinted downstream, which keeps the fingerprint independent of
//! line wrapping.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::IngestConfig;
use crate::error::IngestError;

pub(crate) fn decode_base64(content: &str, cfg: &IngestConfig) -> Result<Vec<u8>, IngestError> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if compact.is_empty() {
        return Err(IngestError::EmptyPayload);
    }

    // Reject before allocating the decoded buffer.
    if let Some(limit) = cfg.max_payload_bytes {
        let estimated = compact.len() / 4 * 3;
        if estimated > limit.saturating_add(2) {
            return Err(IngestError::PayloadTooLarge {
                size: estimated,
                limit,
            });
        }
    }

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| IngestError::Decode(err.to_string()))?;

    if bytes.is_empty() {
        return Err(IngestError::EmptyPayload);
    }
    if let Some(limit) = cfg.max_payload_bytes {
        if bytes.len() > limit {
            return Err(IngestError::PayloadTooLarge {
                size: bytes.len(),
                limit,
            });
        }
    }

    Ok(bytes)
}
