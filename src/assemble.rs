//! Pure assembly of stage outputs into a [`ProcessingResult`].
//!
//! Status derivation:
//!
//! | Stage outcome | `validationStatus` | `processingStatus` |
//! |---------------|--------------------|--------------------|
//! | decode / parse failed | `SCHEMA_ERROR` | `FAILED` |
//! | any `ERROR` finding | `INVALID` | `PROCESSED` |
//! | no `ERROR`, data extracted | `VALID` | `PROCESSED` |
//! | no `ERROR`, extraction failed | `SYSTEM_ERROR` | `FAILED` |
//! | unexpected failure | `SYSTEM_ERROR` | `FAILED` |
//!
//! `FAILED` always comes with at least one processing error.
use chrono::{DateTime, Utc};
use dedup::DuplicateCheckResult;
use extract::{ExtractError, ExtractedTradeData};
use validate::ValidationReport;

use crate::PipelineError;
use crate::result::{
    ProcessingError, ProcessingResult, ProcessingStatus, ResponseLinks, ValidationStatus,
};

/// What the stages produced for one message.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    /// The document was parsed and validated.
    Checked {
        report: ValidationReport,
        /// `None` when extraction did not run (the report has errors).
        extraction: Option<Result<ExtractedTradeData, ExtractError>>,
        /// `None` when the duplicate check was skipped.
        duplicate_check: Option<DuplicateCheckResult>,
    },
    /// The message never produced a validated document.
    Failed(PipelineError),
}

/// Identity and timing of one processing call.
#[derive(Debug, Clone)]
pub struct Envelope<'a> {
    pub message_id: &'a str,
    pub processing_id: &'a str,
    pub received_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

pub fn assemble(envelope: Envelope<'_>, outcome: StageOutcome) -> ProcessingResult {
    let mut result = ProcessingResult {
        message_id: envelope.message_id.to_string(),
        processing_id: envelope.processing_id.to_string(),
        processing_status: ProcessingStatus::Processed,
        validation_status: ValidationStatus::Valid,
        received_at: envelope.received_at,
        processed_at: envelope.processed_at,
        document_type: None,
        findings: Vec::new(),
        extracted_data: None,
        processing_errors: Vec::new(),
        duplicate_check: None,
        links: ResponseLinks::for_processing_id(envelope.processing_id),
    };

    match outcome {
        StageOutcome::Failed(err) => fail(&mut result, &err),
        StageOutcome::Checked {
            report,
            extraction,
            duplicate_check,
        } => {
            result.document_type = report.document_type;
            result.duplicate_check = duplicate_check;
            let invalid = report.has_errors();
            result.findings = report.into_findings();

            if invalid {
                result.validation_status = ValidationStatus::Invalid;
            } else {
                match extraction {
                    Some(Ok(data)) => result.extracted_data = Some(data),
                    Some(Err(err)) => fail(&mut result, &PipelineError::Extract(err)),
                    None => fail(
                        &mut result,
                        &PipelineError::Internal(
                            "extraction did not run for a document without errors".into(),
                        ),
                    ),
                }
            }
        }
    }

    result
}

fn fail(result: &mut ProcessingResult, err: &PipelineError) {
    result.processing_status = ProcessingStatus::Failed;
    result.validation_status = err.class().validation_status();
    result.processing_errors.push(ProcessingError {
        error_code: err.error_code().to_string(),
        error_message: err.to_string(),
        timestamp: result.processed_at,
        retryable: err.is_retryable(),
    });
}
