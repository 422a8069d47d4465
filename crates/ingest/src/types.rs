//! Inbound message model.
//!
//! These types mirror the record handed over by the HTTP layer. The pipeline
//! treats them as read-only input: nothing in the workspace mutates an
//! [`IncomingMessage`] once it has been received.
//!
//! ```text
//! IncomingMessage
//! ├── message_id: String
//! ├── message_type: String
//! ├── fpml_version: String
//! ├── sender_lei: String
//! ├── receiver_lei: Option<String>
//! ├── content_base64: String            ("fpmlContent" on the wire)
//! ├── correlation_id / parent_message_id / business_date: Option<String>
//! └── processing_flags: ProcessingFlags
//!     ├── skip_duplicate_check: bool
//!     ├── force_processing: bool
//!     ├── strict_validation: bool
//!     └── priority: Priority
//! ```
use serde::{Deserialize, Serialize};

/// A trade-confirmation message as submitted by a sender.
///
/// Envelope constraints (non-blank `message_id`, LEI and version patterns) are
/// enforced by the transport layer before the message reaches the pipeline.
///
/// # Example
///
/// ```rust
/// use ingest::{IncomingMessage, ProcessingFlags};
///
/// let message = IncomingMessage::new(
///     "MSG-001",
///     "TradeConfirmation",
///     "5.12",
///     "529900T8BM49AURSDO55",
///     "PGRhdGFEb2N1bWVudC8+",
/// )
/// .with_correlation_id("corr-1");
///
/// assert_eq!(message.processing_flags, ProcessingFlags::default());
/// assert_eq!(message.correlation_id.as_deref(), Some("corr-1"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    pub message_id: String,
    pub message_type: String,
    pub fpml_version: String,
    pub sender_lei: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_lei: Option<String>,
    /// Base64-encoded FpML document.
    #[serde(rename = "fpmlContent")]
    pub content_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_date: Option<String>,
    #[serde(default)]
    pub processing_flags: ProcessingFlags,
}

impl IncomingMessage {
    /// Build a message with the mandatory envelope fields and default flags.
    pub fn new(
        message_id: impl Into<String>,
        message_type: impl Into<String>,
        fpml_version: impl Into<String>,
        sender_lei: impl Into<String>,
        content_base64: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            message_type: message_type.into(),
            fpml_version: fpml_version.into(),
            sender_lei: sender_lei.into(),
            receiver_lei: None,
            content_base64: content_base64.into(),
            correlation_id: None,
            parent_message_id: None,
            business_date: None,
            processing_flags: ProcessingFlags::default(),
        }
    }

    pub fn with_receiver_lei(mut self, lei: impl Into<String>) -> Self {
        self.receiver_lei = Some(lei.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_parent_message_id(mut self, parent: impl Into<String>) -> Self {
        self.parent_message_id = Some(parent.into());
        self
    }

    pub fn with_business_date(mut self, date: impl Into<String>) -> Self {
        self.business_date = Some(date.into());
        self
    }

    pub fn with_flags(mut self, flags: ProcessingFlags) -> Self {
        self.processing_flags = flags;
        self
    }
}

/// Special-handling instructions supplied by the sender.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingFlags {
    /// Do not consult the duplicate store for this message.
    pub skip_duplicate_check: bool,
    /// Carried through to the persisted record; no effect on core processing.
    pub force_processing: bool,
    /// Promote WARNING findings to ERROR before status derivation.
    pub strict_validation: bool,
    pub priority: Priority,
}

/// Sender-assigned processing priority.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}
