//! Field candidate paths.
//!
//! Each field lists paths in preference order; the first one that yields a
//! non-empty value wins. The alternates cover the places different product
//! schemas put the same fact (an IRS `effectiveDate` wraps an
//! `unadjustedDate`, an FX trade has no `effectiveDate` at all).
use std::fmt;

use ingest::LocalPath;
use tracing::warn;

pub(crate) const UTI_SCHEME: &str =
    "http://www.fpml.org/coding-scheme/external/unique-transaction-identifier";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeField {
    TradeId,
    Uti,
    Usi,
    TradeDate,
    EffectiveDate,
    MaturityDate,
    NotionalAmount,
    Currency,
    ProductType,
}

impl TradeField {
    pub const ALL: [TradeField; 9] = [
        TradeField::TradeId,
        TradeField::Uti,
        TradeField::Usi,
        TradeField::TradeDate,
        TradeField::EffectiveDate,
        TradeField::MaturityDate,
        TradeField::NotionalAmount,
        TradeField::Currency,
        TradeField::ProductType,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TradeField::TradeId => "tradeId",
            TradeField::Uti => "uti",
            TradeField::Usi => "usi",
            TradeField::TradeDate => "tradeDate",
            TradeField::EffectiveDate => "effectiveDate",
            TradeField::MaturityDate => "maturityDate",
            TradeField::NotionalAmount => "notionalAmount",
            TradeField::Currency => "currency",
            TradeField::ProductType => "productType",
        }
    }

    pub(crate) fn candidates(self) -> Vec<String> {
        let fixed: &[&str] = match self {
            TradeField::TradeId => &["//tradeId"],
            TradeField::Uti => {
                return vec![
                    "//uti".to_string(),
                    format!("//tradeId[@tradeIdScheme='{UTI_SCHEME}']"),
                ]
            }
            TradeField::Usi => &["//usi"],
            TradeField::TradeDate => &["//tradeDate"],
            TradeField::EffectiveDate => &[
                "//effectiveDate/unadjustedDate",
                "//effectiveDate/adjustedDate",
                "//effectiveDate",
            ],
            TradeField::MaturityDate => &[
                "//maturityDate",
                "//terminationDate/unadjustedDate",
                "//terminationDate",
            ],
            TradeField::NotionalAmount => &[
                "//notionalAmount",
                "//notionalStepSchedule/initialValue",
                "//notional/amount",
            ],
            TradeField::Currency => &["//currency"],
            TradeField::ProductType => &["//productType"],
        };
        fixed.iter().map(|path| path.to_string()).collect()
    }
}

impl fmt::Display for TradeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compile expressions, dropping (and logging) any that do not parse.
pub(crate) fn compile(label: &str, expressions: &[String]) -> Vec<LocalPath> {
    expressions
        .iter()
        .filter_map(|expression| match LocalPath::parse(expression) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(field = label, error = %err, "fpml_extract_path_rejected");
                None
            }
        })
        .collect()
}

/// Path to the LEI of the `position`-th party element in document order.
pub(crate) fn party_lei_expression(position: usize, lei_scheme: &str) -> String {
    if lei_scheme.contains('\'') {
        format!("//party[{position}]/partyId[@partyIdScheme=\"{lei_scheme}\"]")
    } else {
        format!("//party[{position}]/partyId[@partyIdScheme='{lei_scheme}']")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_candidate_parses() {
        for field in TradeField::ALL {
            let expressions = field.candidates();
            assert!(!expressions.is_empty());
            assert_eq!(compile(field.name(), &expressions).len(), expressions.len());
        }
    }

    #[test]
    fn party_expression_quotes_around_apostrophes() {
        let path = party_lei_expression(2, "urn:it's");
        assert_eq!(path, r#"//party[2]/partyId[@partyIdScheme="urn:it's"]"#);
        assert!(LocalPath::parse(&path).is_ok());
    }
}
