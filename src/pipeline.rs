//! Per-message orchestration.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dedup::{DuplicateChecker, DuplicateStore, NeverDuplicate};
use extract::{ExtractError, ExtractedTradeData, Extractor};
use futures::stream::{self, StreamExt};
use ingest::IncomingMessage;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;
use validate::ValidationReport;

use crate::assemble::{Envelope, StageOutcome, assemble};
use crate::config::PipelineConfig;
use crate::result::{ProcessedMessage, ProcessingStatus};
use crate::{MetricsSpan, PipelineError};

/// Output of the synchronous (CPU-bound) stages.
struct DocumentStages {
    fingerprint: Option<String>,
    decoded_len: Option<usize>,
    checked: Result<Checked, PipelineError>,
}

struct Checked {
    report: ValidationReport,
    extraction: Option<Result<ExtractedTradeData, ExtractError>>,
}

/// The intake pipeline. Cheap to share behind an `Arc`; every call to
/// [`Pipeline::process`] owns its own document and derived data.
#[derive(Debug, Clone)]
pub struct Pipeline {
    cfg: PipelineConfig,
    extractor: Extractor,
    checker: DuplicateChecker,
}

impl Pipeline {
    /// Pipeline whose duplicate store never reports a duplicate.
    pub fn new(cfg: PipelineConfig) -> Self {
        Self::with_store(cfg, Arc::new(NeverDuplicate))
    }

    pub fn with_store(cfg: PipelineConfig, store: Arc<dyn DuplicateStore>) -> Self {
        let extractor = Extractor::new(&cfg.extract);
        let checker = DuplicateChecker::new(store, cfg.dedup.clone());
        Self {
            cfg,
            extractor,
            checker,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Process one message. Never fails; every outcome is a result.
    pub async fn process(&self, message: &IncomingMessage) -> ProcessedMessage {
        let processing_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "fpml_message",
            message_id = %message.message_id,
            processing_id = %processing_id,
        );
        self.process_with_id(message, processing_id)
            .instrument(span)
            .await
    }

    /// Process independent messages with at most `max_concurrency` in flight.
    /// Results come back in input order.
    pub async fn process_batch(&self, messages: &[IncomingMessage]) -> Vec<ProcessedMessage> {
        stream::iter(messages)
            .map(|message| self.process(message))
            .buffered(self.cfg.max_concurrency.max(1))
            .collect()
            .await
    }

    async fn process_with_id(
        &self,
        message: &IncomingMessage,
        processing_id: String,
    ) -> ProcessedMessage {
        let start = Instant::now();
        let received_at = Utc::now();

        let stages = match panic::catch_unwind(AssertUnwindSafe(|| self.run_document_stages(message))) {
            Ok(stages) => stages,
            Err(payload) => DocumentStages {
                fingerprint: None,
                decoded_len: None,
                checked: Err(PipelineError::Internal(panic_message(payload.as_ref()))),
            },
        };

        let mut checked_fingerprint = None;
        let outcome = match stages.checked {
            Ok(Checked { report, extraction }) => {
                let duplicate_check = match &stages.fingerprint {
                    Some(fp) if !message.processing_flags.skip_duplicate_check => {
                        let span = MetricsSpan::start();
                        let check = self.checker.check(&message.message_id, fp).await;
                        if let Some(span) = span {
                            span.record_duplicate_check(&check);
                        }
                        checked_fingerprint = Some(fp.as_str());
                        Some(check)
                    }
                    _ => None,
                };
                StageOutcome::Checked {
                    report,
                    extraction,
                    duplicate_check,
                }
            }
            Err(err) => StageOutcome::Failed(err),
        };

        let result = assemble(
            Envelope {
                message_id: &message.message_id,
                processing_id: &processing_id,
                received_at,
                processed_at: Utc::now(),
            },
            outcome,
        );

        if let Some(fp) = checked_fingerprint {
            if result.processing_status == ProcessingStatus::Processed && !result.is_duplicate() {
                self.checker
                    .remember(&message.message_id, fp, received_at)
                    .await;
            }
        }

        info!(
            processing_status = ?result.processing_status,
            validation_status = ?result.validation_status,
            findings = result.findings.len(),
            processing_errors = result.processing_errors.len(),
            duplicate = result.is_duplicate(),
            elapsed_micros = start.elapsed().as_micros(),
            "fpml_processed"
        );

        ProcessedMessage {
            result,
            fingerprint: stages.fingerprint,
            decoded_len: stages.decoded_len,
        }
    }

    fn run_document_stages(&self, message: &IncomingMessage) -> DocumentStages {
        let mut decode_metrics = MetricsSpan::start();
        let bytes = match ingest::decode(&message.content_base64, &self.cfg.ingest) {
            Ok(bytes) => bytes,
            Err(err) => {
                if let Some(span) = decode_metrics.take() {
                    span.record_decode(Err(err.clone()));
                }
                return DocumentStages {
                    fingerprint: None,
                    decoded_len: None,
                    checked: Err(err.into()),
                };
            }
        };
        let fingerprint = Some(dedup::fingerprint(&bytes));
        let decoded_len = Some(bytes.len());

        let document = match ingest::parse(&bytes, &self.cfg.ingest) {
            Ok(document) => {
                if let Some(span) = decode_metrics.take() {
                    span.record_decode(Ok(()));
                }
                document
            }
            Err(err) => {
                if let Some(span) = decode_metrics.take() {
                    span.record_decode(Err(err.clone()));
                }
                return DocumentStages {
                    fingerprint,
                    decoded_len,
                    checked: Err(err.into()),
                };
            }
        };
        drop(bytes);

        let validation_metrics = MetricsSpan::start();
        let mut report = validate::validate(&document);
        if message.processing_flags.strict_validation {
            report.promote_warnings();
        }
        if let Some(span) = validation_metrics {
            span.record_validation(report.error_count());
        }

        let extraction = if report.has_errors() {
            None
        } else {
            let extraction_metrics = MetricsSpan::start();
            let extracted = self.extractor.try_extract(&document);
            if let Some(span) = extraction_metrics {
                span.record_extraction(extracted.as_ref().map(|_| ()).map_err(|err| err.clone()));
            }
            Some(extracted)
        };

        DocumentStages {
            fingerprint,
            decoded_len,
            checked: Ok(Checked { report, extraction }),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "pipeline stage panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use ingest::ProcessingFlags;

    use super::*;
    use crate::result::ValidationStatus;

    fn message(xml: &str) -> IncomingMessage {
        IncomingMessage::new(
            "MSG-1",
            "TradeConfirmation",
            "5.12",
            "529900T8BM49AURSDO55",
            STANDARD.encode(xml),
        )
    }

    #[tokio::test]
    async fn fingerprint_survives_parse_failure() {
        let processed = Pipeline::default().process(&message("<a><b></a>")).await;

        assert_eq!(processed.result.validation_status, ValidationStatus::SchemaError);
        assert_eq!(processed.decoded_len, Some("<a><b></a>".len()));
        assert_eq!(
            processed.fingerprint.as_deref(),
            Some(dedup::fingerprint(b"<a><b></a>").as_str())
        );
        assert!(processed.result.duplicate_check.is_none());
    }

    #[tokio::test]
    async fn skip_flag_omits_duplicate_check() {
        let msg = message("<dataDocument><trade/><party/></dataDocument>").with_flags(
            ProcessingFlags {
                skip_duplicate_check: true,
                ..Default::default()
            },
        );
        let processed = Pipeline::default().process(&msg).await;
        assert_eq!(processed.result.validation_status, ValidationStatus::Valid);
        assert!(processed.result.duplicate_check.is_none());
    }

    #[tokio::test]
    async fn strict_mode_blocks_on_warnings() {
        let xml = "<dataDocument><trade/></dataDocument>";
        let lenient = Pipeline::default().process(&message(xml)).await;
        assert_eq!(lenient.result.validation_status, ValidationStatus::Valid);

        let strict_msg = message(xml).with_flags(ProcessingFlags {
            strict_validation: true,
            ..Default::default()
        });
        let strict = Pipeline::default().process(&strict_msg).await;
        assert_eq!(strict.result.validation_status, ValidationStatus::Invalid);
        assert!(strict.result.extracted_data.is_none());
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload = panic::catch_unwind(|| panic!("stage exploded")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "stage exploded");
    }
}
