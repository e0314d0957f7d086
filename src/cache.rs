//! Heavy cache: single-slot TTL memoization of the remote fetch.
//!
//! The fetch takes no meaningful parameters, so the cache is keyed by
//! nothing but time. The slot lock is held across the fetch, which makes
//! concurrent readers coalesce onto a single network round-trip.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::sheets::{Dataset, FetchError};

/// Default time-to-live for the fetched dataset (1 hour). Sheet data
/// barely changes intra-session.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Slot {
    dataset: Arc<Dataset>,
    fetched_at: Instant,
}

/// TTL cache around the remote fetch. Cleared only by expiry or an
/// explicit reload.
pub struct DatasetCache {
    slot: Mutex<Option<Slot>>,
    ttl: Duration,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    /// Return the cached dataset, or run `fetch` and store its result.
    ///
    /// On a failed refresh the previous (stale) slot is left in place, so
    /// callers that tolerate staleness can retry without losing data.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Arc<Dataset>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Dataset, FetchError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(existing) = slot.as_ref() {
            if existing.fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&existing.dataset));
            }
        }

        let dataset = Arc::new(fetch().await?);
        *slot = Some(Slot {
            dataset: Arc::clone(&dataset),
            fetched_at: Instant::now(),
        });
        Ok(dataset)
    }

    /// Clear the slot immediately, regardless of remaining TTL.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
    }

    /// Age of the cached dataset, if any.
    pub async fn age(&self) -> Option<Duration> {
        let slot = self.slot.lock().await;
        slot.as_ref().map(|s| s.fetched_at.elapsed())
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dataset() -> Dataset {
        Dataset::default()
    }

    #[tokio::test]
    async fn second_call_within_ttl_skips_fetch() {
        let cache = DatasetCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(dataset())
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_slot_refetches() {
        let cache = DatasetCache::with_ttl(Duration::ZERO);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .get_or_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(dataset())
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_exactly_one_fresh_fetch() {
        let cache = DatasetCache::new();
        let calls = AtomicUsize::new(0);
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(dataset())
        };

        cache.get_or_fetch(fetch).await.unwrap();
        cache.invalidate().await;
        assert!(cache.age().await.is_none());

        let fetch2 = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(dataset())
        };
        cache.get_or_fetch(fetch2).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_readers_coalesce_onto_one_fetch() {
        let cache = Arc::new(DatasetCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let a = {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .get_or_fetch(|| async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(dataset())
                    })
                    .await
                    .unwrap();
            })
        };
        let b = {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .get_or_fetch(|| async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(dataset())
                    })
                    .await
                    .unwrap();
            })
        };
        let (ra, rb) = tokio::join!(a, b);
        ra.unwrap();
        rb.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_slot() {
        let cache = DatasetCache::with_ttl(Duration::ZERO);
        cache.get_or_fetch(|| async { Ok(dataset()) }).await.unwrap();

        let err = cache
            .get_or_fetch(|| async {
                Err(FetchError::SourceNotFound("gone".to_string()))
            })
            .await;
        assert!(err.is_err());
        // The stale dataset is still in the slot.
        assert!(cache.age().await.is_some());
    }
}
