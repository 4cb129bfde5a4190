use chrono::{DateTime, Utc};
use flowguard_flow_store::Database;
use std::sync::{Arc, Barrier};
use vision_cache::{
    CacheError, CacheKey, CacheStats, MemoryVisionStore, SqliteVisionStore, StoreOutcome,
    TokenUsage, VisionCacheEntry, VisionJudgment, VisionStore, VisionVerdictCache,
};

fn judgment(verdict: bool, confidence: f64) -> VisionJudgment {
    VisionJudgment {
        verdict,
        confidence,
        reasoning: "primary button rendered".into(),
        tokens: TokenUsage {
            input: 1_500,
            output: 60,
        },
        cost: 0.0054,
    }
}

fn key(hash: &str) -> CacheKey {
    CacheKey::new(hash, "a1", "m1", "v1").unwrap()
}

fn memory_cache() -> Arc<VisionVerdictCache> {
    Arc::new(VisionVerdictCache::new(Arc::new(MemoryVisionStore::new())))
}

fn sqlite_cache(dir: &tempfile::TempDir) -> Arc<VisionVerdictCache> {
    let db = Database::open(dir.path().join("flowguard.db")).unwrap();
    Arc::new(VisionVerdictCache::new(Arc::new(SqliteVisionStore::new(&db))))
}

/// Fire `concurrency` lookups on `key` at once and return the hit counts
/// each caller observed.
async fn concurrent_lookups(
    cache: &Arc<VisionVerdictCache>,
    key: &CacheKey,
    concurrency: usize,
) -> Vec<u64> {
    let barrier = Arc::new(Barrier::new(concurrency));
    let handles: Vec<_> = (0..concurrency)
        .map(|_| {
            let cache = Arc::clone(cache);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            tokio::task::spawn_blocking(move || {
                barrier.wait();
                cache.lookup(&key).unwrap().expect("live entry").hit_count
            })
        })
        .collect();

    let mut observed = Vec::with_capacity(concurrency);
    for handle in handles {
        observed.push(handle.await.unwrap());
    }
    observed.sort_unstable();
    observed
}

async fn assert_exact_hit_count(cache: Arc<VisionVerdictCache>, concurrency: usize) {
    cache.store(key("h1"), judgment(true, 90.0)).unwrap();
    cache.store(key("h2"), judgment(false, 35.0)).unwrap();

    let observed = concurrent_lookups(&cache, &key("h1"), concurrency).await;

    // every caller saw a distinct count, 1..=C, no lost or duplicate increments
    let expected: Vec<u64> = (1..=concurrency as u64).collect();
    assert_eq!(observed, expected);

    let entry = cache.peek(&key("h1")).unwrap().unwrap();
    assert_eq!(entry.hit_count, concurrency as u64);
    assert_eq!(cache.peek(&key("h2")).unwrap().unwrap().hit_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_store_counts_five_concurrent_hits() {
    assert_exact_hit_count(memory_cache(), 5).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn memory_store_counts_fifty_concurrent_hits() {
    assert_exact_hit_count(memory_cache(), 50).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_store_counts_five_concurrent_hits() {
    let dir = tempfile::tempdir().unwrap();
    assert_exact_hit_count(sqlite_cache(&dir), 5).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn sqlite_store_counts_fifty_concurrent_hits() {
    let dir = tempfile::tempdir().unwrap();
    assert_exact_hit_count(sqlite_cache(&dir), 50).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stored_verdict_survives_concurrent_hits_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let cache = sqlite_cache(&dir);
    let key = CacheKey::new("h1", "a1", "m1", "v1").unwrap();

    assert_eq!(
        cache.store(key.clone(), judgment(true, 90.0)).unwrap(),
        StoreOutcome::Inserted
    );
    assert_eq!(cache.peek(&key).unwrap().unwrap().hit_count, 0);

    concurrent_lookups(&cache, &key, 5).await;

    let entry = cache.peek(&key).unwrap().unwrap();
    assert_eq!(entry.hit_count, 5);
    assert!(entry.judgment.verdict);
    assert_eq!(entry.judgment.confidence, 90.0);
    assert_eq!(entry.judgment.tokens.input, 1_500);
}

#[test]
fn sqlite_miss_leaves_other_entries_alone() {
    let db = Database::open_memory().unwrap();
    let cache = VisionVerdictCache::new(Arc::new(SqliteVisionStore::new(&db)));
    cache.store(key("h1"), judgment(true, 90.0)).unwrap();
    cache.lookup(&key("h1")).unwrap();

    assert!(cache.lookup(&key("other")).unwrap().is_none());
    let wrong_model = CacheKey::new("h1", "a1", "m2", "v1").unwrap();
    assert!(cache.lookup(&wrong_model).unwrap().is_none());

    assert_eq!(cache.peek(&key("h1")).unwrap().unwrap().hit_count, 1);
    assert_eq!(
        cache.stats().unwrap(),
        CacheStats {
            entries: 1,
            live: 1,
            total_hits: 1
        }
    );
}

#[test]
fn sqlite_store_keeps_first_live_entry_and_replaces_expired() {
    let db = Database::open_memory().unwrap();
    let store = SqliteVisionStore::new(&db);
    let now = Utc::now();

    let first = VisionCacheEntry::fresh(key("h1"), judgment(true, 90.0), now, chrono::Duration::hours(1));
    assert_eq!(store.insert(first).unwrap(), StoreOutcome::Inserted);
    store.find_and_increment(&key("h1"), now).unwrap();

    let second = VisionCacheEntry::fresh(key("h1"), judgment(false, 5.0), now, chrono::Duration::hours(1));
    assert_eq!(store.insert(second).unwrap(), StoreOutcome::AlreadyCached);
    let kept = store.peek(&key("h1")).unwrap().unwrap();
    assert!(kept.judgment.verdict);
    assert_eq!(kept.hit_count, 1);

    let later = now + chrono::Duration::hours(2);
    let third = VisionCacheEntry::fresh(key("h1"), judgment(false, 5.0), later, chrono::Duration::hours(1));
    assert_eq!(store.insert(third).unwrap(), StoreOutcome::Replaced);
    let replaced = store.peek(&key("h1")).unwrap().unwrap();
    assert!(!replaced.judgment.verdict);
    assert_eq!(replaced.hit_count, 0);
}

#[test]
fn sqlite_purge_only_touches_expired_rows() {
    let db = Database::open_memory().unwrap();
    let store = SqliteVisionStore::new(&db);
    let now = Utc::now();
    let ttl = chrono::Duration::minutes(10);

    store
        .insert(VisionCacheEntry::fresh(key("old"), judgment(true, 80.0), now - chrono::Duration::minutes(20), ttl))
        .unwrap();
    store
        .insert(VisionCacheEntry::fresh(key("new"), judgment(true, 80.0), now, ttl))
        .unwrap();

    assert!(store.find_and_increment(&key("old"), now).unwrap().is_none());
    assert_eq!(store.purge_expired(now).unwrap(), 1);
    assert!(store.peek(&key("old")).unwrap().is_none());
    assert!(store.peek(&key("new")).unwrap().is_some());
}

/// A store whose lookups claim a hit without incrementing.
struct NonIncrementingStore(MemoryVisionStore);

impl VisionStore for NonIncrementingStore {
    fn find_and_increment(
        &self,
        key: &CacheKey,
        _now: DateTime<Utc>,
    ) -> Result<Option<VisionCacheEntry>, CacheError> {
        self.0.peek(key)
    }

    fn insert(&self, entry: VisionCacheEntry) -> Result<StoreOutcome, CacheError> {
        self.0.insert(entry)
    }

    fn peek(&self, key: &CacheKey) -> Result<Option<VisionCacheEntry>, CacheError> {
        self.0.peek(key)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        self.0.purge_expired(now)
    }

    fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats, CacheError> {
        self.0.stats(now)
    }
}

#[test]
fn hit_without_increment_is_an_invariant_violation() {
    let cache = VisionVerdictCache::new(Arc::new(NonIncrementingStore(MemoryVisionStore::new())));
    cache.store(key("h1"), judgment(true, 90.0)).unwrap();

    let err = cache.lookup(&key("h1")).unwrap_err();
    assert!(matches!(err, CacheError::InvariantViolation { hit_count: 0, .. }));
}
