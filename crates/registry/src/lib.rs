//! FpML document type registry.
//!
//! A pure lookup table from root element local name to a
//! [`DocumentTypeDescriptor`]. It holds no mutable state, so one registry is
//! shared freely between concurrent pipeline invocations.
//!
//! ## What lives here
//!
//! - [`DocumentType`]: the closed set of 24 supported root elements spanning
//!   confirmations, statements, notifications and clearing requests
//! - [`lookup`] / [`is_supported`]: resolve a root element name
//! - [`all_element_names`] / [`trade_required_types`]: derived sets used to
//!   build validation predicates without repeating the list elsewhere
//!
//! ## Example
//!
//! ```
//! use registry::{lookup, is_supported};
//!
//! let descriptor = lookup("dataDocument").expect("known type");
//! assert!(descriptor.requires_trade);
//! assert!(!is_supported("unknownRoot"));
//! ```
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

mod document_type;

pub use crate::document_type::{DocumentType, DocumentTypeDescriptor};

use crate::document_type::DESCRIPTORS;

fn by_element_name() -> &'static HashMap<&'static str, DocumentType> {
    static INDEX: OnceLock<HashMap<&'static str, DocumentType>> = OnceLock::new();
    INDEX.get_or_init(|| {
        DESCRIPTORS
            .iter()
            .map(|(ty, descriptor)| (descriptor.element_name, *ty))
            .collect()
    })
}

pub(crate) fn lookup_type(element_name: &str) -> Option<DocumentType> {
    by_element_name().get(element_name).copied()
}

/// Descriptor for a root element local name, or `None` when unsupported.
pub fn lookup(element_name: &str) -> Option<&'static DocumentTypeDescriptor> {
    lookup_type(element_name).map(DocumentType::descriptor)
}

/// Whether `element_name` is one of the supported root elements.
pub fn is_supported(element_name: &str) -> bool {
    by_element_name().contains_key(element_name)
}

/// Every supported root element name.
pub fn all_element_names() -> BTreeSet<&'static str> {
    DESCRIPTORS.iter().map(|(_, d)| d.element_name).collect()
}

/// Document types whose documents must carry a `trade` element.
pub fn trade_required_types() -> BTreeSet<DocumentType> {
    DESCRIPTORS
        .iter()
        .filter(|(_, d)| d.requires_trade)
        .map(|(ty, _)| *ty)
        .collect()
}

/// Comma-separated element names in declaration order, for diagnostics.
pub fn supported_types_string() -> String {
    DESCRIPTORS
        .iter()
        .map(|(_, d)| d.element_name)
        .collect::<Vec<_>>()
        .join(", ")
}
