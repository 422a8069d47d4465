//! Projection of a processed message into the record handed to persistence.
//!
//! The record keeps the original envelope verbatim, adds what the pipeline
//! learned (hash, size, statuses, findings, extracted identifiers) and stamps
//! the entity metadata the store expects for a freshly received message.
use chrono::{DateTime, Utc};
use dedup::DuplicateCheckResult;
use ingest::{IncomingMessage, ProcessingFlags};
use serde::{Deserialize, Serialize};
use validate::ValidationFinding;

use crate::result::{ProcessedMessage, ProcessingError, ProcessingStatus, ValidationStatus};

pub const ENTITY_TYPE: &str = "TradeConfirmation";
pub const ENTITY_VERSION: &str = "1000";
pub const INITIAL_WORKFLOW_STATE: &str = "received";

/// Stored in place of a hash when the content could not be decoded.
pub const HASH_UNAVAILABLE: &str = "hash_calculation_failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeConfirmationEntity {
    pub message_id: String,
    pub message_type: String,
    pub fpml_version: String,
    pub sender_id: String,
    pub sender_lei: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_lei: Option<String>,
    pub received_timestamp: DateTime<Utc>,
    pub message_timestamp: DateTime<Utc>,
    pub fpml_content: String,
    pub message_size: usize,
    pub message_hash: String,
    pub validation_status: ValidationStatus,
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub validation_results: Vec<ValidationFinding>,
    pub processing_results: ProcessingResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_date: Option<String>,
    pub processing_flags: ProcessingFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_check_results: Option<DuplicateCheckResult>,
    pub metadata: EntityMetadata,
}

/// Identifiers pulled out of the document, plus any processing errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_trade_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_uti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_usi: Option<String>,
    /// `None` rather than empty when nothing went wrong.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_errors: Option<Vec<ProcessingError>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub entity_type: String,
    pub entity_version: String,
    pub created_timestamp: DateTime<Utc>,
    pub workflow_state: String,
}

impl EntityMetadata {
    pub fn received(created_at: DateTime<Utc>) -> Self {
        Self {
            entity_type: ENTITY_TYPE.to_string(),
            entity_version: ENTITY_VERSION.to_string(),
            created_timestamp: created_at,
            workflow_state: INITIAL_WORKFLOW_STATE.to_string(),
        }
    }
}

impl TradeConfirmationEntity {
    /// Build the persisted record for `message`.
    ///
    /// `correlation_id` is the transport-level id (e.g. a request header); when
    /// `None` the id carried on the message itself is used.
    pub fn project(
        message: &IncomingMessage,
        processed: &ProcessedMessage,
        correlation_id: Option<&str>,
    ) -> Self {
        let result = &processed.result;

        let mut processing_results = ProcessingResults::default();
        if let Some(data) = &result.extracted_data {
            processing_results.extracted_trade_id = data.trade_id.clone();
            processing_results.extracted_uti = data.uti.clone();
            processing_results.extracted_usi = data.usi.clone();
        }
        if !result.processing_errors.is_empty() {
            processing_results.processing_errors = Some(result.processing_errors.clone());
        }

        Self {
            message_id: message.message_id.clone(),
            message_type: message.message_type.clone(),
            fpml_version: message.fpml_version.clone(),
            sender_id: message.sender_lei.clone(),
            sender_lei: message.sender_lei.clone(),
            receiver_id: message.receiver_lei.clone(),
            receiver_lei: message.receiver_lei.clone(),
            received_timestamp: result.received_at,
            message_timestamp: result.received_at,
            fpml_content: message.content_base64.clone(),
            message_size: processed
                .decoded_len
                .unwrap_or(message.content_base64.len()),
            message_hash: processed
                .fingerprint
                .clone()
                .unwrap_or_else(|| HASH_UNAVAILABLE.to_string()),
            validation_status: result.validation_status,
            processing_status: result.processing_status,
            validation_results: result.findings.clone(),
            processing_results,
            correlation_id: correlation_id
                .map(str::to_string)
                .or_else(|| message.correlation_id.clone()),
            parent_message_id: message.parent_message_id.clone(),
            business_date: message.business_date.clone(),
            processing_flags: message.processing_flags.clone(),
            duplicate_check_results: result.duplicate_check.clone(),
            metadata: EntityMetadata::received(Utc::now()),
        }
    }
}
