//! Verdict cache with TTL and atomic hit counting
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::errors::CacheError;
use crate::key::CacheKey;
use crate::models::{CacheStats, StoreOutcome, VisionCacheEntry, VisionJudgment};
use crate::store::VisionStore;

pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Cache of vision verdicts in front of a [`VisionStore`].
///
/// Entries are created only by [`store`](Self::store), mutated only by the
/// hit increment in [`lookup`](Self::lookup) and removed only by
/// [`purge_expired`](Self::purge_expired). An entry past its `expires_at`
/// is a miss whether or not it has been purged yet.
#[derive(Clone)]
pub struct VisionVerdictCache {
    store: Arc<dyn VisionStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl VisionVerdictCache {
    pub fn new(store: Arc<dyn VisionStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live entry for `key`, counting the hit.
    pub fn lookup(&self, key: &CacheKey) -> Result<Option<VisionCacheEntry>, CacheError> {
        let now = self.clock.now();
        let Some(entry) = self.store.find_and_increment(key, now)? else {
            debug!(key = %key, "vision cache miss");
            return Ok(None);
        };
        if entry.hit_count == 0 {
            error!(key = %key, "vision cache returned a hit without incrementing it");
            return Err(CacheError::InvariantViolation {
                key: key.to_string(),
                hit_count: entry.hit_count as i64,
            });
        }
        debug!(key = %key, hit_count = entry.hit_count, "vision cache hit");
        Ok(Some(entry))
    }

    /// Cache a fresh judgment under `key` for one TTL.
    pub fn store(&self, key: CacheKey, judgment: VisionJudgment) -> Result<StoreOutcome, CacheError> {
        let entry = VisionCacheEntry::fresh(key, judgment, self.clock.now(), self.ttl);
        let key = entry.key.clone();
        let outcome = self.store.insert(entry)?;
        debug!(key = %key, ?outcome, "vision cache store");
        Ok(outcome)
    }

    /// Read an entry without counting a hit.
    pub fn peek(&self, key: &CacheKey) -> Result<Option<VisionCacheEntry>, CacheError> {
        self.store.peek(key)
    }

    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let purged = self.store.purge_expired(self.clock.now())?;
        if purged > 0 {
            info!(purged, "purged expired vision verdicts");
        }
        Ok(purged)
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        self.store.stats(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::TokenUsage;
    use crate::store::MemoryVisionStore;

    fn judgment(verdict: bool, confidence: f64) -> VisionJudgment {
        VisionJudgment {
            verdict,
            confidence,
            reasoning: "button is visible".into(),
            tokens: TokenUsage {
                input: 1_200,
                output: 80,
            },
            cost: 0.0048,
        }
    }

    fn cache() -> (VisionVerdictCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = VisionVerdictCache::new(Arc::new(MemoryVisionStore::new()))
            .with_clock(clock.clone())
            .with_ttl(Duration::hours(1));
        (cache, clock)
    }

    fn key(hash: &str) -> CacheKey {
        CacheKey::new(hash, "a1", "m1", "v1").unwrap()
    }

    #[test]
    fn store_starts_at_zero_hits() {
        let (cache, _) = cache();
        assert_eq!(
            cache.store(key("h1"), judgment(true, 90.0)).unwrap(),
            StoreOutcome::Inserted
        );
        let entry = cache.peek(&key("h1")).unwrap().unwrap();
        assert_eq!(entry.hit_count, 0);
        assert_eq!(entry.expires_at - entry.created_at, Duration::hours(1));
    }

    #[test]
    fn lookup_counts_hits_and_miss_does_not_mutate() {
        let (cache, _) = cache();
        cache.store(key("h1"), judgment(true, 90.0)).unwrap();
        cache.store(key("h2"), judgment(false, 40.0)).unwrap();

        assert_eq!(cache.lookup(&key("h1")).unwrap().unwrap().hit_count, 1);
        assert_eq!(cache.lookup(&key("h1")).unwrap().unwrap().hit_count, 2);
        assert!(cache.lookup(&key("nope")).unwrap().is_none());

        assert_eq!(cache.peek(&key("h1")).unwrap().unwrap().hit_count, 2);
        assert_eq!(cache.peek(&key("h2")).unwrap().unwrap().hit_count, 0);
    }

    #[test]
    fn expired_entries_are_misses_before_purge() {
        let (cache, clock) = cache();
        cache.store(key("h1"), judgment(true, 90.0)).unwrap();
        clock.advance(Duration::hours(1));

        assert!(cache.lookup(&key("h1")).unwrap().is_none());
        let physical = cache.peek(&key("h1")).unwrap().unwrap();
        assert_eq!(physical.hit_count, 0);

        let stats = cache.stats().unwrap();
        assert_eq!((stats.entries, stats.live, stats.expired()), (1, 0, 1));
    }

    #[test]
    fn duplicate_store_keeps_live_entry() {
        let (cache, _) = cache();
        cache.store(key("h1"), judgment(true, 90.0)).unwrap();
        cache.lookup(&key("h1")).unwrap();

        let outcome = cache.store(key("h1"), judgment(false, 10.0)).unwrap();
        assert_eq!(outcome, StoreOutcome::AlreadyCached);
        let entry = cache.peek(&key("h1")).unwrap().unwrap();
        assert!(entry.judgment.verdict);
        assert_eq!(entry.hit_count, 1);
    }

    #[test]
    fn duplicate_store_replaces_expired_entry() {
        let (cache, clock) = cache();
        cache.store(key("h1"), judgment(true, 90.0)).unwrap();
        cache.lookup(&key("h1")).unwrap();
        clock.advance(Duration::hours(2));

        let outcome = cache.store(key("h1"), judgment(false, 10.0)).unwrap();
        assert_eq!(outcome, StoreOutcome::Replaced);
        let entry = cache.peek(&key("h1")).unwrap().unwrap();
        assert!(!entry.judgment.verdict);
        assert_eq!(entry.hit_count, 0);
    }

    #[test]
    fn purge_removes_only_expired() {
        let (cache, clock) = cache();
        cache.store(key("old"), judgment(true, 90.0)).unwrap();
        clock.advance(Duration::minutes(45));
        cache.store(key("new"), judgment(true, 90.0)).unwrap();
        clock.advance(Duration::minutes(30));

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert!(cache.peek(&key("old")).unwrap().is_none());
        assert!(cache.peek(&key("new")).unwrap().is_some());
    }
}
