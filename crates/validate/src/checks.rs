//! The ordered structural checks.
//!
//! 1. root element must be a registered document type, otherwise stop
//! 2. resolve the document type
//! 3. a `trade` element must exist when the type requires one
//! 4. at least one `party` element should exist
//! 5. no findings at all yields a single `VALIDATION_SUCCESS`
use ingest::{LocalPath, ParsedDocument, QueryError};
use registry::DocumentType;
use tracing::info;

use crate::finding::{codes, ValidationFinding};

const TRADE_PATH: &str = "//trade";
const PARTY_PATH: &str = "//party";

pub(crate) struct CheckOutcome {
    pub document_type: Option<DocumentType>,
    pub findings: Vec<ValidationFinding>,
}

pub(crate) fn run_checks(document: &ParsedDocument) -> Result<CheckOutcome, QueryError> {
    let mut findings = Vec::new();

    let root_name = document.root_name();
    let Some(document_type) = DocumentType::from_element_name(root_name) else {
        findings.push(
            ValidationFinding::error(
                codes::INVALID_ROOT,
                format!(
                    "Document must have a supported FpML root element. Supported types: {}",
                    registry::supported_types_string()
                ),
            )
            .at("/")
            .actual(root_name),
        );
        return Ok(CheckOutcome {
            document_type: None,
            findings,
        });
    };

    info!(
        document_type = document_type.element_name(),
        description = document_type.description(),
        "fpml_document_type"
    );

    if document_type.requires_trade() && !exists(document, TRADE_PATH)? {
        findings.push(
            ValidationFinding::error(
                codes::MISSING_TRADE,
                format!(
                    "FpML document of type '{}' must contain a trade element",
                    document_type.element_name()
                ),
            )
            .at(TRADE_PATH)
            .expected("trade"),
        );
    }

    if !exists(document, PARTY_PATH)? {
        findings.push(
            ValidationFinding::warning(
                codes::MISSING_PARTIES,
                "FpML document should contain party information",
            )
            .at(PARTY_PATH)
            .expected("party"),
        );
    }

    if findings.is_empty() {
        findings.push(ValidationFinding::info(
            codes::VALIDATION_SUCCESS,
            "FpML document structure is valid",
        ));
    }

    Ok(CheckOutcome {
        document_type: Some(document_type),
        findings,
    })
}

fn exists(document: &ParsedDocument, expression: &str) -> Result<bool, QueryError> {
    let path = LocalPath::parse(expression)?;
    Ok(!document.select(&path).is_empty())
}
