//! Workspace umbrella crate for FpML trade-confirmation intake.
//!
//! This crate stitches the stage crates into one pipeline so callers can hand
//! over an [`IncomingMessage`] and get back a single structured
//! [`ProcessingResult`]:
//!
//! ```text
//! decode ─▶ parse ─▶ validate ─▶ extract ─▶ duplicate check ─▶ assemble
//! ```
//!
//! Every outcome is data. Malformed transport content ends as
//! `SCHEMA_ERROR`, structural problems as `INVALID` with findings, and
//! anything unexpected (including a panic inside a stage) as `SYSTEM_ERROR`.
//!
//! ## Example
//!
//! ```
//! use fpml_intake::{IncomingMessage, Pipeline, PipelineConfig, ValidationStatus};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let message = IncomingMessage::new(
//!     "MSG-1",
//!     "TradeConfirmation",
//!     "5.12",
//!     "529900T8BM49AURSDO55",
//!     "not-base64!!",
//! );
//!
//! let processed = pipeline.process(&message).await;
//! assert_eq!(processed.result.validation_status, ValidationStatus::SchemaError);
//! # }
//! ```

mod assemble;
mod config;
mod entity;
mod pipeline;
mod result;

pub use dedup::{
    DedupConfig, DedupError, DuplicateCheckResult, DuplicateChecker, DuplicateStore,
    InMemoryDuplicateStore, NeverDuplicate, PriorSubmission, fingerprint,
};
pub use extract::{
    CounterpartyInfo, CounterpartyRole, ExtractConfig, ExtractError, ExtractedTradeData,
    Extractor, TradingCapacity,
};
pub use ingest::{
    IncomingMessage, IngestConfig, IngestError, LocalPath, ParsedDocument, Priority,
    ProcessingFlags, QueryError,
};
pub use registry::{DocumentType, DocumentTypeDescriptor};
pub use validate::{Severity, ValidationFinding, ValidationReport, codes};

pub use crate::assemble::{Envelope, StageOutcome, assemble};
pub use crate::config::{ConfigLoadError, PipelineConfig};
pub use crate::entity::{
    ENTITY_TYPE, ENTITY_VERSION, EntityMetadata, HASH_UNAVAILABLE, ProcessingResults,
    TradeConfirmationEntity,
};
pub use crate::pipeline::Pipeline;
pub use crate::result::{
    ProcessedMessage, ProcessingError, ProcessingResult, ProcessingStatus, ResponseLinks,
    ValidationStatus,
};

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Which outcome class a pipeline failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The input itself is malformed. Resubmitting it will fail again.
    Schema,
    /// Infrastructure or internal failure. Worth retrying.
    System,
}

impl ErrorClass {
    pub fn validation_status(self) -> ValidationStatus {
        match self {
            ErrorClass::Schema => ValidationStatus::SchemaError,
            ErrorClass::System => ValidationStatus::SystemError,
        }
    }

    pub fn is_retryable(self) -> bool {
        self == ErrorClass::System
    }
}

/// Errors that stop a message short of a complete result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Ingest(IngestError),
    Extract(ExtractError),
    /// A stage panicked or an invariant was broken.
    Internal(String),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Ingest(_) => ErrorClass::Schema,
            PipelineError::Extract(_) | PipelineError::Internal(_) => ErrorClass::System,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::Ingest(err) => err.error_code(),
            PipelineError::Extract(err) => err.error_code(),
            PipelineError::Internal(_) => "SYSTEM_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "Failed to process FpML message: {err}"),
            PipelineError::Extract(err) => write!(f, "Failed to extract trade data: {err}"),
            PipelineError::Internal(reason) => write!(f, "internal pipeline failure: {reason}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Extract(err) => Some(err),
            PipelineError::Internal(_) => None,
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<ExtractError> for PipelineError {
    fn from(value: ExtractError) -> Self {
        PipelineError::Extract(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    /// Decode and parse, together.
    fn record_decode(&self, latency: Duration, result: Result<(), IngestError>);
    fn record_validation(&self, latency: Duration, error_findings: usize);
    fn record_extraction(&self, latency: Duration, result: Result<(), ExtractError>);
    fn record_duplicate_check(&self, latency: Duration, check: &DuplicateCheckResult);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_decode(self, result: Result<(), IngestError>) {
        self.recorder.record_decode(self.start.elapsed(), result);
    }

    pub(crate) fn record_validation(self, error_findings: usize) {
        self.recorder
            .record_validation(self.start.elapsed(), error_findings);
    }

    pub(crate) fn record_extraction(self, result: Result<(), ExtractError>) {
        self.recorder.record_extraction(self.start.elapsed(), result);
    }

    pub(crate) fn record_duplicate_check(self, check: &DuplicateCheckResult) {
        self.recorder
            .record_duplicate_check(self.start.elapsed(), check);
    }
}
