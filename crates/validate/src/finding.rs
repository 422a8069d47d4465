//! Validation findings and their wire shape.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Finding codes emitted by the structural checks.
pub mod codes {
    pub const INVALID_ROOT: &str = "INVALID_ROOT";
    pub const MISSING_TRADE: &str = "MISSING_TRADE";
    pub const MISSING_PARTIES: &str = "MISSING_PARTIES";
    pub const VALIDATION_SUCCESS: &str = "VALIDATION_SUCCESS";
    pub const XPATH_ERROR: &str = "XPATH_ERROR";
}

/// Every finding produced by this crate is a structural (schema-shaped) check.
pub const SCHEMA_VALIDATION: &str = "SCHEMA";

/// How much a finding matters. Only [`Severity::Error`] blocks extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

/// One observation about a document's structure.
///
/// Serialized with the external field names (`errorCode`, `errorMessage`,
/// `expectedValue`, `actualValue`); absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFinding {
    pub validation_type: String,
    pub severity: Severity,
    #[serde(rename = "errorCode")]
    pub code: String,
    #[serde(rename = "errorMessage")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    #[serde(rename = "expectedValue", default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(rename = "actualValue", default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationFinding {
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            validation_type: SCHEMA_VALIDATION.to_string(),
            severity,
            code: code.into(),
            message: message.into(),
            field_path: None,
            expected: None,
            actual: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn at(mut self, field_path: impl Into<String>) -> Self {
        self.field_path = Some(field_path.into());
        self
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
