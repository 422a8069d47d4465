//! Error types produced by the ingest crate.
//!
//! | Error | Raised by | Outcome class |
//! |-------|-----------|---------------|
//! | [`Decode`](IngestError::Decode) | [`decode`](crate::decode) | schema error, not retryable |
//! | [`EmptyPayload`](IngestError::EmptyPayload) | [`decode`](crate::decode) | schema error, not retryable |
//! | [`PayloadTooLarge`](IngestError::PayloadTooLarge) | [`decode`](crate::decode) | schema error, not retryable |
//! | [`Parse`](IngestError::Parse) | [`parse`](crate::parse) | schema error, not retryable |
//! | [`DepthExceeded`](IngestError::DepthExceeded) | [`parse`](crate::parse) | schema error, not retryable |
//!
//! [`QueryError`] is separate: it signals a malformed path expression, which
//! is a programming error on the caller's side rather than bad input.
use thiserror::Error;

/// Failures turning transport content into a parsed document.
///
/// Every variant describes malformed input, so none of them are worth
/// retrying with the same payload.
///
/// ```rust
/// use ingest::IngestError;
///
/// let err = IngestError::Decode("Invalid symbol 33, offset 3.".into());
/// assert_eq!(err.error_code(), "DECODE_ERROR");
/// assert!(!err.is_retryable());
/// assert!(err.to_string().contains("base64"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// Content is not valid base64.
    #[error("invalid base64 encoded FpML content: {0}")]
    Decode(String),

    /// Content decoded to zero bytes (or was blank).
    #[error("FpML content is empty")]
    EmptyPayload,

    /// Decoded content exceeds the configured limit.
    #[error("FpML payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Content is not well-formed XML, is not UTF-8, or declares a DTD.
    #[error("malformed FpML XML: {0}")]
    Parse(String),

    /// Element nesting is deeper than the configured limit.
    #[error("FpML element nesting exceeds depth limit of {limit}")]
    DepthExceeded { limit: usize },
}

impl IngestError {
    /// Stable code reported in processing errors.
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestError::Decode(_) | IngestError::EmptyPayload => "DECODE_ERROR",
            IngestError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            IngestError::Parse(_) | IngestError::DepthExceeded { .. } => "PARSE_ERROR",
        }
    }

    /// Malformed input never becomes valid by resubmitting it.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// A path expression that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryError {
    #[error("malformed path `{path}`: {reason}")]
    Malformed { path: String, reason: &'static str },
}

impl QueryError {
    pub(crate) fn malformed(path: &str, reason: &'static str) -> Self {
        QueryError::Malformed {
            path: path.to_string(),
            reason,
        }
    }
}
