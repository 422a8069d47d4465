//! FpML Trade Data Extractor
//!
//! Reads a fixed set of trade facts out of a validated [`ParsedDocument`].
//! Extraction is tolerant by construction: every field is resolved on its
//! own, and a field that is absent (or whose path cannot be evaluated) is
//! `None` without affecting any other field.
//!
//! ## Counterparties
//!
//! Roles are assigned by position: the first `party` element in document
//! order becomes `PARTY_A`, the second `PARTY_B`, both with trading capacity
//! `PRINCIPAL`. This is a heuristic. FpML does not tie party order to role,
//! and some document types list the parties the other way round; a consumer
//! that needs the true role must resolve it from `partyReference`s itself.
//! A party whose LEI (the `partyId` carrying the configured scheme) cannot be
//! read is left out of the list rather than padded.
//!
//! ## Example
//!
//! ```
//! use extract::{extract, ExtractConfig};
//! use ingest::{parse, IngestConfig};
//!
//! let xml = br#"<dataDocument><trade><tradeHeader><tradeDate>2024-03-01</tradeDate></tradeHeader></trade></dataDocument>"#;
//! let doc = parse(xml, &IngestConfig::default()).unwrap();
//!
//! let data = extract(&doc, &ExtractConfig::default()).expect("extraction succeeds");
//! assert_eq!(data.trade_date.as_deref(), Some("2024-03-01"));
//! assert!(data.counterparties.is_empty());
//! ```
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use ingest::{LocalPath, ParsedDocument};
use thiserror::Error;
use tracing::{debug, warn};

mod config;
mod fields;
mod types;

pub use crate::config::{ConfigError, ExtractConfig, ISO_17442_SCHEME};
pub use crate::fields::TradeField;
pub use crate::types::{CounterpartyInfo, CounterpartyRole, ExtractedTradeData, TradingCapacity};

/// The extraction step as a whole failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("trade data extraction aborted: {0}")]
    Aborted(String),
}

impl ExtractError {
    pub fn error_code(&self) -> &'static str {
        "EXTRACTION_ERROR"
    }

    /// The input was well-formed, so a failure here is not the sender's fault.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Precompiled field and counterparty paths for one [`ExtractConfig`].
///
/// Build once and share; extraction itself only reads.
#[derive(Debug, Clone)]
pub struct Extractor {
    fields: Vec<(TradeField, Vec<LocalPath>)>,
    parties: [(CounterpartyRole, Vec<LocalPath>); 2],
}

impl Extractor {
    pub fn new(cfg: &ExtractConfig) -> Self {
        let fields = TradeField::ALL
            .iter()
            .map(|field| (*field, fields::compile(field.name(), &field.candidates())))
            .collect();

        let party = |position: usize| {
            fields::compile(
                "counterparties",
                &[fields::party_lei_expression(position, &cfg.lei_scheme)],
            )
        };

        Self {
            fields,
            parties: [
                (CounterpartyRole::PartyA, party(1)),
                (CounterpartyRole::PartyB, party(2)),
            ],
        }
    }

    /// Extract trade data, converting a panic anywhere in the step into
    /// [`ExtractError::Aborted`].
    pub fn try_extract(&self, document: &ParsedDocument) -> Result<ExtractedTradeData, ExtractError> {
        let start = Instant::now();
        match panic::catch_unwind(AssertUnwindSafe(|| self.extract_fields(document))) {
            Ok(data) => {
                debug!(
                    populated = data.populated_fields(),
                    counterparties = data.counterparties.len(),
                    elapsed_micros = start.elapsed().as_micros(),
                    "fpml_extraction_complete"
                );
                Ok(data)
            }
            Err(payload) => {
                let err = ExtractError::Aborted(panic_message(payload.as_ref()));
                warn!(error = %err, "fpml_extraction_failure");
                Err(err)
            }
        }
    }

    /// `None` when the step as a whole failed; see [`Extractor::try_extract`].
    pub fn extract(&self, document: &ParsedDocument) -> Option<ExtractedTradeData> {
        self.try_extract(document).ok()
    }

    /// Value of a single field.
    pub fn field(&self, document: &ParsedDocument, field: TradeField) -> Option<String> {
        self.fields
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .and_then(|(_, paths)| first_value(document, paths))
    }

    fn extract_fields(&self, document: &ParsedDocument) -> ExtractedTradeData {
        let mut data = ExtractedTradeData::default();
        for (field, paths) in &self.fields {
            let value = first_value(document, paths);
            let slot = match field {
                TradeField::TradeId => &mut data.trade_id,
                TradeField::Uti => &mut data.uti,
                TradeField::Usi => &mut data.usi,
                TradeField::TradeDate => &mut data.trade_date,
                TradeField::EffectiveDate => &mut data.effective_date,
                TradeField::MaturityDate => &mut data.maturity_date,
                TradeField::NotionalAmount => &mut data.notional_amount,
                TradeField::Currency => &mut data.currency,
                TradeField::ProductType => &mut data.product_type,
            };
            *slot = value;
        }

        data.counterparties = self
            .parties
            .iter()
            .filter_map(|(role, paths)| {
                first_value(document, paths).map(|lei| CounterpartyInfo {
                    lei,
                    role: *role,
                    trading_capacity: TradingCapacity::Principal,
                })
            })
            .collect();

        data
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&ExtractConfig::default())
    }
}

/// One-shot extraction with a freshly compiled [`Extractor`].
pub fn extract(document: &ParsedDocument, cfg: &ExtractConfig) -> Option<ExtractedTradeData> {
    Extractor::new(cfg).extract(document)
}

fn first_value(document: &ParsedDocument, paths: &[LocalPath]) -> Option<String> {
    paths.iter().find_map(|path| document.value(path))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "extraction panicked".to_string()
    }
}
