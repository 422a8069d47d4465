use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DedupConfig;
use crate::store::{DedupError, DuplicateStore, NeverDuplicate, PriorSubmission};

/// Comparison criteria reported with every check.
pub const DUPLICATE_CRITERIA: [&str; 2] = ["messageId", "messageHash"];

/// Outcome of one duplicate lookup.
///
/// `note` is set whenever the answer did not come from a completed lookup
/// (disabled, timed out, store failure); `is_duplicate` is then `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResult {
    pub is_duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_message_id: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub criteria_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DuplicateCheckResult {
    fn new(original: Option<PriorSubmission>, note: Option<String>) -> Self {
        Self {
            is_duplicate: original.is_some(),
            original_message_id: original.map(|prior| prior.message_id),
            checked_at: Utc::now(),
            criteria_used: DUPLICATE_CRITERIA.iter().map(|c| c.to_string()).collect(),
            note,
        }
    }

    /// A non-duplicate answer that carries an advisory note.
    pub fn degraded(note: impl Into<String>) -> Self {
        Self::new(None, Some(note.into()))
    }
}

/// Runs lookups against a [`DuplicateStore`] within a bounded time.
#[derive(Clone)]
pub struct DuplicateChecker {
    store: Arc<dyn DuplicateStore>,
    cfg: DedupConfig,
}

impl DuplicateChecker {
    pub fn new(store: Arc<dyn DuplicateStore>, cfg: DedupConfig) -> Self {
        Self { store, cfg }
    }

    pub fn config(&self) -> &DedupConfig {
        &self.cfg
    }

    /// Look up `message_id` / `fingerprint` among submissions inside the window.
    ///
    /// Never fails: a timeout or store error yields `is_duplicate = false`
    /// with a note explaining why.
    pub async fn check(&self, message_id: &str, fingerprint: &str) -> DuplicateCheckResult {
        if !self.cfg.enabled {
            return DuplicateCheckResult::degraded("duplicate check disabled");
        }

        let start = Instant::now();
        let since = window_start(&self.cfg);
        let lookup = self.store.find(message_id, fingerprint, since);

        let outcome = match tokio::time::timeout(self.cfg.lookup_timeout(), lookup).await {
            Ok(result) => result,
            Err(_) => Err(DedupError::Timeout(self.cfg.lookup_timeout_ms)),
        };

        match outcome {
            Ok(prior) => {
                debug!(
                    message_id,
                    is_duplicate = prior.is_some(),
                    elapsed_micros = start.elapsed().as_micros(),
                    "duplicate_check_complete"
                );
                DuplicateCheckResult::new(prior, None)
            }
            Err(err) => {
                warn!(
                    message_id,
                    error = %err,
                    elapsed_micros = start.elapsed().as_micros(),
                    "duplicate_check_degraded"
                );
                DuplicateCheckResult::degraded(format!(
                    "{err}; treated as not a duplicate"
                ))
            }
        }
    }

    /// Record a processed submission. Best effort: failures are logged, not returned.
    ///
    /// The current window start goes to the store so it can retire entries
    /// that no longer count.
    pub async fn remember(&self, message_id: &str, fingerprint: &str, received_at: DateTime<Utc>) {
        if !self.cfg.enabled {
            return;
        }
        let submission = PriorSubmission {
            message_id: message_id.to_string(),
            fingerprint: fingerprint.to_string(),
            received_at,
        };
        let since = window_start(&self.cfg);
        let write = self.store.remember(submission, since);
        match tokio::time::timeout(self.cfg.lookup_timeout(), write).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(message_id, error = %err, "duplicate_remember_failed"),
            Err(_) => warn!(
                message_id,
                timeout_ms = self.cfg.lookup_timeout_ms,
                "duplicate_remember_timed_out"
            ),
        }
    }
}

impl Default for DuplicateChecker {
    fn default() -> Self {
        Self::new(Arc::new(NeverDuplicate), DedupConfig::default())
    }
}

impl std::fmt::Debug for DuplicateChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateChecker")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

fn window_start(cfg: &DedupConfig) -> DateTime<Utc> {
    ChronoDuration::from_std(cfg.window())
        .ok()
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
