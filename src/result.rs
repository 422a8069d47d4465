//! The immutable outcome of processing one message.
use chrono::{DateTime, Utc};
use dedup::DuplicateCheckResult;
use extract::ExtractedTradeData;
use registry::DocumentType;
use serde::{Deserialize, Serialize};
use validate::ValidationFinding;

const CONFIRMATIONS_PATH: &str = "/api/v1/trade-confirmations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Processed,
    Failed,
}

/// Which of the three outcome classes a message landed in.
///
/// - `Invalid`: well-formed but structurally wrong
/// - `SchemaError`: not decodable or not well-formed
/// - `SystemError`: something failed that was not the sender's fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    SchemaError,
    SystemError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingError {
    pub error_code: String,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub status: String,
}

impl ResponseLinks {
    pub fn for_processing_id(processing_id: &str) -> Self {
        Self {
            self_link: format!("{CONFIRMATIONS_PATH}/{processing_id}"),
            status: format!("{CONFIRMATIONS_PATH}/{processing_id}/status"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub message_id: String,
    pub processing_id: String,
    pub processing_status: ProcessingStatus,
    pub validation_status: ValidationStatus,
    #[serde(rename = "receivedTimestamp")]
    pub received_at: DateTime<Utc>,
    #[serde(rename = "processedTimestamp")]
    pub processed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(rename = "validationResults", default)]
    pub findings: Vec<ValidationFinding>,
    #[serde(rename = "extractedTradeData", default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ExtractedTradeData>,
    #[serde(default)]
    pub processing_errors: Vec<ProcessingError>,
    #[serde(rename = "duplicateCheckResults", default, skip_serializing_if = "Option::is_none")]
    pub duplicate_check: Option<DuplicateCheckResult>,
    pub links: ResponseLinks,
}

impl ProcessingResult {
    pub fn is_processed(&self) -> bool {
        self.processing_status == ProcessingStatus::Processed
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate_check
            .as_ref()
            .is_some_and(|check| check.is_duplicate)
    }
}

/// A [`ProcessingResult`] plus what the pipeline learned about the raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMessage {
    pub result: ProcessingResult,
    /// Hex SHA-256 of the decoded content; `None` when it could not be decoded.
    pub fingerprint: Option<String>,
    /// Decoded content length; `None` when it could not be decoded.
    pub decoded_len: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_point_at_processing_id() {
        let links = ResponseLinks::for_processing_id("abc");
        assert_eq!(links.self_link, "/api/v1/trade-confirmations/abc");
        assert_eq!(links.status, "/api/v1/trade-confirmations/abc/status");

        let json = serde_json::to_value(&links).unwrap();
        assert_eq!(json["self"], "/api/v1/trade-confirmations/abc");
    }

    #[test]
    fn statuses_use_wire_spelling() {
        assert_eq!(
            serde_json::to_value(ValidationStatus::SchemaError).unwrap(),
            "SCHEMA_ERROR"
        );
        assert_eq!(
            serde_json::to_value(ValidationStatus::SystemError).unwrap(),
            "SYSTEM_ERROR"
        );
        assert_eq!(
            serde_json::to_value(ProcessingStatus::Processed).unwrap(),
            "PROCESSED"
        );
    }
}
