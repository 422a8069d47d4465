//! The duplicate store seam.
//!
//! Where previously seen submissions live is a deployment decision, so the
//! checker only talks to a [`DuplicateStore`]. Two implementations ship:
//! [`NeverDuplicate`] (the default, reports nothing as seen) and
//! [`InMemoryDuplicateStore`] for tests and single-process deployments.
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The in-memory store sweeps out-of-window entries once every this many inserts.
const PRUNE_EVERY: usize = 256;

/// A submission the store has accepted before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorSubmission {
    pub message_id: String,
    pub fingerprint: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DedupError {
    #[error("duplicate store unavailable: {0}")]
    Unavailable(String),
    #[error("duplicate lookup timed out after {0} ms")]
    Timeout(u64),
}

#[async_trait]
pub trait DuplicateStore: Send + Sync {
    /// Earliest submission received at or after `since` that shares either
    /// the message id or the content fingerprint.
    async fn find(
        &self,
        message_id: &str,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<PriorSubmission>, DedupError>;

    /// Record a processed submission.
    ///
    /// `since` is the start of the current window: anything received before
    /// it no longer counts as a prior sighting and may be replaced or dropped.
    async fn remember(
        &self,
        submission: PriorSubmission,
        since: DateTime<Utc>,
    ) -> Result<(), DedupError>;
}

/// Store that has never seen anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverDuplicate;

#[async_trait]
impl DuplicateStore for NeverDuplicate {
    async fn find(
        &self,
        _message_id: &str,
        _fingerprint: &str,
        _since: DateTime<Utc>,
    ) -> Result<Option<PriorSubmission>, DedupError> {
        Ok(None)
    }

    async fn remember(
        &self,
        _submission: PriorSubmission,
        _since: DateTime<Utc>,
    ) -> Result<(), DedupError> {
        Ok(())
    }
}

/// Process-local store keyed by both message id and fingerprint.
///
/// Within the window the earliest submission for a key is kept, so
/// `original_message_id` names the first sighting. Once that entry falls out
/// of the window the next submission takes its place. Expired entries are
/// swept periodically from [`remember`](DuplicateStore::remember).
#[derive(Debug, Default)]
pub struct InMemoryDuplicateStore {
    by_message_id: DashMap<String, PriorSubmission>,
    by_fingerprint: DashMap<String, PriorSubmission>,
    inserts: AtomicUsize,
}

impl InMemoryDuplicateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_fingerprint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fingerprint.is_empty() && self.by_message_id.is_empty()
    }

    /// Drop entries received before `cutoff`. Returns how many fingerprints were evicted.
    pub fn evict_before(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.by_fingerprint.len();
        self.by_fingerprint.retain(|_, prior| prior.received_at >= cutoff);
        self.by_message_id.retain(|_, prior| prior.received_at >= cutoff);
        before - self.by_fingerprint.len()
    }
}

fn record(
    map: &DashMap<String, PriorSubmission>,
    key: &str,
    submission: &PriorSubmission,
    since: DateTime<Utc>,
) {
    map.entry(key.to_string())
        .and_modify(|prior| {
            if prior.received_at < since || submission.received_at < prior.received_at {
                *prior = submission.clone();
            }
        })
        .or_insert_with(|| submission.clone());
}

#[async_trait]
impl DuplicateStore for InMemoryDuplicateStore {
    async fn find(
        &self,
        message_id: &str,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<PriorSubmission>, DedupError> {
        let by_id = self
            .by_message_id
            .get(message_id)
            .map(|entry| entry.value().clone());
        let by_fp = self
            .by_fingerprint
            .get(fingerprint)
            .map(|entry| entry.value().clone());

        Ok([by_id, by_fp]
            .into_iter()
            .flatten()
            .filter(|prior| prior.received_at >= since)
            .min_by_key(|prior| prior.received_at))
    }

    async fn remember(
        &self,
        submission: PriorSubmission,
        since: DateTime<Utc>,
    ) -> Result<(), DedupError> {
        record(&self.by_message_id, &submission.message_id, &submission, since);
        record(&self.by_fingerprint, &submission.fingerprint, &submission, since);

        if self.inserts.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            let evicted = self.evict_before(since);
            debug!(evicted, remaining = self.len(), "duplicate_store_pruned");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn submission(id: &str, fp: &str, at: DateTime<Utc>) -> PriorSubmission {
        PriorSubmission {
            message_id: id.into(),
            fingerprint: fp.into(),
            received_at: at,
        }
    }

    #[tokio::test]
    async fn never_duplicate_finds_nothing() {
        let store = NeverDuplicate;
        let now = Utc::now();
        let since = now - Duration::hours(1);
        store.remember(submission("m1", "fp", now), since).await.unwrap();
        assert_eq!(store.find("m1", "fp", since).await, Ok(None));
    }

    #[tokio::test]
    async fn matches_on_either_key() {
        let store = InMemoryDuplicateStore::new();
        let now = Utc::now();
        let since = now - Duration::hours(1);
        store
            .remember(submission("m1", "fp-1", now), since)
            .await
            .unwrap();

        let by_id = store.find("m1", "other", since).await.unwrap();
        assert_eq!(by_id.map(|p| p.fingerprint), Some("fp-1".to_string()));

        let by_fp = store.find("m2", "fp-1", since).await.unwrap();
        assert_eq!(by_fp.map(|p| p.message_id), Some("m1".to_string()));

        assert_eq!(store.find("m3", "fp-3", since).await.unwrap(), None);
    }

    #[tokio::test]
    async fn first_sighting_is_kept() {
        let store = InMemoryDuplicateStore::new();
        let now = Utc::now();
        let since = now - Duration::hours(1);
        store.remember(submission("m1", "fp", now), since).await.unwrap();
        store
            .remember(submission("m2", "fp", now + Duration::seconds(5)), since)
            .await
            .unwrap();

        let prior = store.find("m9", "fp", since).await.unwrap().unwrap();
        assert_eq!(prior.message_id, "m1");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn resubmission_after_expiry_starts_a_new_window() {
        let store = InMemoryDuplicateStore::new();
        let window = Duration::hours(24);
        let now = Utc::now();

        let first_at = now - Duration::days(2);
        store
            .remember(submission("m1", "fp", first_at), first_at - window)
            .await
            .unwrap();
        assert_eq!(store.find("m2", "fp", now - window).await, Ok(None));

        store
            .remember(submission("m2", "fp", now), now - window)
            .await
            .unwrap();

        let later = now + Duration::minutes(1);
        let prior = store.find("m3", "fp", later - window).await.unwrap();
        assert_eq!(prior.map(|p| p.message_id), Some("m2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn remember_sweeps_expired_entries() {
        let store = InMemoryDuplicateStore::new();
        let now = Utc::now();
        let since = now - Duration::hours(24);
        store
            .remember(submission("old", "fp-old", now - Duration::days(2)), since)
            .await
            .unwrap();

        for i in 0..PRUNE_EVERY {
            store
                .remember(submission(&format!("m{i}"), &format!("fp-{i}"), now), since)
                .await
                .unwrap();
        }

        assert_eq!(store.len(), PRUNE_EVERY);
        let far_past = now - Duration::days(30);
        assert_eq!(store.find("old", "fp-old", far_past).await, Ok(None));
    }

    #[tokio::test]
    async fn window_excludes_old_submissions() {
        let store = InMemoryDuplicateStore::new();
        let now = Utc::now();
        store
            .remember(
                submission("old", "fp", now - Duration::days(2)),
                now - Duration::days(3),
            )
            .await
            .unwrap();

        assert_eq!(store.find("old", "fp", now - Duration::days(1)).await, Ok(None));
        assert!(store
            .find("old", "fp", now - Duration::days(3))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn eviction_drops_expired_entries() {
        let store = InMemoryDuplicateStore::new();
        let now = Utc::now();
        let since = now - Duration::days(3);
        store
            .remember(submission("a", "fp-a", now - Duration::days(2)), since)
            .await
            .unwrap();
        store.remember(submission("b", "fp-b", now), since).await.unwrap();

        assert_eq!(store.evict_before(now - Duration::days(1)), 1);
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}
