//! FpML Duplicate Detection
//!
//! Two halves:
//!
//! - [`fingerprint`]: a deterministic SHA-256 digest of the decoded message
//!   bytes, hex encoded
//! - [`DuplicateChecker`]: asks a pluggable [`DuplicateStore`] whether the
//!   message id or fingerprint was seen inside the configured window, with a
//!   hard timeout
//!
//! The matching policy belongs to the store. The default store,
//! [`NeverDuplicate`], reports every message as new; [`InMemoryDuplicateStore`]
//! matches on either key within the window.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use dedup::{fingerprint, DedupConfig, DuplicateChecker, InMemoryDuplicateStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let checker = DuplicateChecker::new(Arc::new(InMemoryDuplicateStore::new()), DedupConfig::default());
//! let fp = fingerprint(b"<dataDocument/>");
//!
//! assert!(!checker.check("MSG-1", &fp).await.is_duplicate);
//! checker.remember("MSG-1", &fp, chrono::Utc::now()).await;
//! assert!(checker.check("MSG-2", &fp).await.is_duplicate);
//! # }
//! ```
mod checker;
mod config;
mod hash;
mod store;

pub use crate::checker::{DuplicateCheckResult, DuplicateChecker, DUPLICATE_CRITERIA};
pub use crate::config::{ConfigError, DedupConfig};
pub use crate::hash::fingerprint;
pub use crate::store::{
    DedupError, DuplicateStore, InMemoryDuplicateStore, NeverDuplicate, PriorSubmission,
};
