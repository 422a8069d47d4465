//! FpML Structural Validator
//!
//! Runs a fixed, ordered set of targeted checks over a [`ParsedDocument`]
//! and reports what it saw as data. This is not schema validation: it only
//! confirms the document is a type we know, carries a `trade` when its type
//! demands one, and names its parties.
//!
//! Validation never fails. Anticipated problems become findings; a malformed
//! internal path or a panic inside a check becomes a single
//! `ERROR/XPATH_ERROR` finding.
//!
//! ## Example
//!
//! ```
//! use ingest::{parse, IngestConfig};
//! use validate::{validate, codes, Severity};
//!
//! let doc = parse(b"<dataDocument><trade/><party/></dataDocument>", &IngestConfig::default()).unwrap();
//! let report = validate(&doc);
//!
//! assert!(!report.has_errors());
//! assert_eq!(report.findings[0].code, codes::VALIDATION_SUCCESS);
//! assert_eq!(report.findings[0].severity, Severity::Info);
//! ```
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use ingest::ParsedDocument;
use registry::DocumentType;
use tracing::{error, info};

mod checks;
mod finding;

pub use crate::finding::{codes, Severity, ValidationFinding, SCHEMA_VALIDATION};

/// Findings for one document plus the type resolved from its root, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub document_type: Option<DocumentType>,
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    /// Whether any finding blocks extraction.
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(ValidationFinding::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    /// Strict mode: every `WARNING` becomes an `ERROR`.
    pub fn promote_warnings(&mut self) {
        for finding in &mut self.findings {
            if finding.severity == Severity::Warning {
                finding.severity = Severity::Error;
            }
        }
    }

    pub fn into_findings(self) -> Vec<ValidationFinding> {
        self.findings
    }
}

/// Run the structural checks against `document`.
pub fn validate(document: &ParsedDocument) -> ValidationReport {
    let start = Instant::now();

    let report = match panic::catch_unwind(AssertUnwindSafe(|| checks::run_checks(document))) {
        Ok(Ok(outcome)) => ValidationReport {
            document_type: outcome.document_type,
            findings: outcome.findings,
        },
        Ok(Err(err)) => check_failure(err.to_string()),
        Err(payload) => check_failure(panic_message(payload.as_ref())),
    };

    info!(
        root = %document.root_name(),
        findings = report.findings.len(),
        errors = report.error_count(),
        elapsed_micros = start.elapsed().as_micros(),
        "fpml_validation_complete"
    );
    report
}

fn check_failure(reason: String) -> ValidationReport {
    error!(reason = %reason, "fpml_validation_check_failed");
    ValidationReport {
        document_type: None,
        findings: vec![ValidationFinding::error(
            codes::XPATH_ERROR,
            format!("Error during XML validation: {reason}"),
        )],
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "validation check panicked".to_string()
    }
}
