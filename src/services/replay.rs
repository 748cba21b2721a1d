//! Replay protection: a shared cache of recently seen signatures.

use crate::services::clock::Clock;
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::task::JoinHandle;

/// Storage for seen signatures with per-entry expiry.
///
/// Implementations must make [`insert_if_absent`](Self::insert_if_absent)
/// atomic: of several concurrent calls with the same live signature, exactly
/// one returns `true`.
pub trait ReplayCache: Send + Sync {
    /// Insert `signature` unless a live entry exists. `true` means freshly inserted.
    fn insert_if_absent(&self, signature: &str, ttl: Duration) -> bool;

    /// Whether a live (unexpired) entry exists
    fn contains(&self, signature: &str) -> bool;

    /// Drop expired entries, returning how many were removed
    fn purge_expired(&self) -> usize;

    /// Number of stored entries, expired ones included until purged
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Thread-safe in-memory replay cache.
///
/// Expiry is checked on every read; [`ReplayGuard::start_sweeper`] reclaims
/// memory for entries nobody asks about again.
pub struct InMemoryReplayCache {
    /// signature -> expiry instant
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryReplayCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ReplayCache for InMemoryReplayCache {
    fn insert_if_absent(&self, signature: &str, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let mut entries = self.entries();
        let now = self.clock.now();

        if entries.get(signature).is_some_and(|expiry| *expiry > now) {
            return false;
        }

        let expiry = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        entries.insert(signature.to_string(), expiry);
        true
    }

    fn contains(&self, signature: &str) -> bool {
        let now = self.clock.now();
        self.entries()
            .get(signature)
            .is_some_and(|expiry| *expiry > now)
    }

    fn purge_expired(&self) -> usize {
        let mut entries = self.entries();
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, expiry| *expiry > now);
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Rejects signatures that were already used within the TTL.
#[derive(Clone)]
pub struct ReplayGuard {
    cache: Arc<dyn ReplayCache>,
    ttl: Duration,
}

impl ReplayGuard {
    pub fn new(cache: Arc<dyn ReplayCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// `true` if the signature is present and unexpired
    pub fn seen(&self, signature: &str) -> bool {
        self.cache.contains(signature)
    }

    /// Remember the signature for the TTL; no-op if already present.
    pub fn record(&self, signature: &str) {
        self.cache.insert_if_absent(signature, self.ttl);
    }

    /// Atomically check and record. `true` means first sighting (not a replay).
    ///
    /// The authentication gate only uses this; `seen` followed by `record`
    /// lets two concurrent duplicates through.
    pub fn check_and_record(&self, signature: &str) -> bool {
        self.cache.insert_if_absent(signature, self.ttl)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Spawn a task that purges expired entries every `interval`.
    ///
    /// Abort the returned handle at shutdown.
    pub fn start_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = cache.len(), "swept replay cache");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::{ManualClock, SystemClock};
    use chrono::TimeZone;

    const TTL: Duration = Duration::from_secs(300);

    fn manual_guard() -> (Arc<ManualClock>, ReplayGuard) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ));
        let cache = Arc::new(InMemoryReplayCache::new(clock.clone()));
        (clock, ReplayGuard::new(cache, TTL))
    }

    #[test]
    fn test_first_sighting_then_replay() {
        let (_, guard) = manual_guard();
        assert!(!guard.seen("sig"));
        assert!(guard.check_and_record("sig"));
        assert!(guard.seen("sig"));
        assert!(!guard.check_and_record("sig"));
        assert!(guard.check_and_record("other"));
    }

    #[test]
    fn test_record_is_noop_when_present() {
        let (clock, guard) = manual_guard();
        guard.record("sig");
        clock.advance(chrono::Duration::minutes(4));
        // must not extend the original expiry
        guard.record("sig");
        clock.advance(chrono::Duration::minutes(1));
        assert!(!guard.seen("sig"));
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (clock, guard) = manual_guard();
        assert!(guard.check_and_record("sig"));

        clock.advance(chrono::Duration::seconds(299));
        assert!(!guard.check_and_record("sig"));

        clock.advance(chrono::Duration::seconds(1));
        assert!(!guard.seen("sig"));
        assert!(guard.check_and_record("sig"));
    }

    #[test]
    fn test_purge_expired() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = InMemoryReplayCache::new(clock.clone());
        cache.insert_if_absent("a", Duration::from_secs(10));
        cache.insert_if_absent("b", Duration::from_secs(60));
        assert_eq!(cache.len(), 2);

        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));
    }

    #[test]
    fn test_concurrent_duplicates_admit_exactly_one() {
        let cache = Arc::new(InMemoryReplayCache::new(Arc::new(SystemClock)));
        let guard = ReplayGuard::new(cache, TTL);

        let fresh: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| guard.check_and_record("same-signature")))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|fresh| *fresh)
                .count()
        });

        assert_eq!(fresh, 1);
    }

    #[tokio::test]
    async fn test_sweeper_purges_in_background() {
        let cache = Arc::new(InMemoryReplayCache::new(Arc::new(SystemClock)));
        let guard = ReplayGuard::new(cache.clone(), Duration::from_millis(10));
        assert!(guard.check_and_record("sig"));

        let sweeper = guard.start_sweeper(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(60)).await;
        sweeper.abort();

        assert!(guard.is_empty());
    }
}
