use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vision_cache::{
    CacheError, CacheKey, CacheStats, CachedVisionJudge, MemoryVisionStore, StoreOutcome,
    TokenUsage, VisionCacheEntry, VisionError, VisionJudge, VisionJudgment, VisionStore,
    VisionVerdictCache,
};

struct CountingJudge {
    calls: AtomicUsize,
    verdict: bool,
    model: &'static str,
}

impl CountingJudge {
    fn new(verdict: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            verdict,
            model: "m1",
        }
    }
}

#[async_trait]
impl VisionJudge for CountingJudge {
    fn model(&self) -> &str {
        self.model
    }

    fn prompt_version(&self) -> &str {
        "v1"
    }

    async fn judge(&self, _png: &[u8], assertion: &str) -> Result<VisionJudgment, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(VisionJudgment {
            verdict: self.verdict,
            confidence: 87.5,
            reasoning: format!("checked: {assertion}"),
            tokens: TokenUsage {
                input: 900,
                output: 40,
            },
            cost: 0.0033,
        })
    }
}

fn cache() -> Arc<VisionVerdictCache> {
    Arc::new(VisionVerdictCache::new(Arc::new(MemoryVisionStore::new())))
}

#[tokio::test]
async fn second_identical_judgment_is_served_from_cache() {
    let judge = Arc::new(CountingJudge::new(true));
    let cached = CachedVisionJudge::new(cache(), judge.clone());

    let first = cached.judge(b"png-1", "cart shows one item").await.unwrap();
    assert!(!first.cache_hit);
    assert_eq!(first.hit_count, 0);

    let second = cached.judge(b"png-1", "cart shows one item").await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.hit_count, 1);
    assert_eq!(second.judgment, first.judgment);

    assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn different_screenshot_or_assertion_misses() {
    let judge = Arc::new(CountingJudge::new(false));
    let cached = CachedVisionJudge::new(cache(), judge.clone());

    cached.judge(b"png-1", "cart shows one item").await.unwrap();
    cached.judge(b"png-2", "cart shows one item").await.unwrap();
    cached.judge(b"png-1", "cart is empty").await.unwrap();

    assert_eq!(judge.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn blank_assertion_is_rejected_before_the_judge() {
    let judge = Arc::new(CountingJudge::new(true));
    let cached = CachedVisionJudge::new(cache(), judge.clone());

    let err = cached.judge(b"png-1", "   ").await.unwrap_err();
    assert!(matches!(err, VisionError::Cache(_)));
    assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
}

/// Blocks the calling thread on every read and write, like a busy SQLite file.
struct SlowStore {
    inner: MemoryVisionStore,
    delay: Duration,
}

impl VisionStore for SlowStore {
    fn find_and_increment(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> Result<Option<VisionCacheEntry>, CacheError> {
        std::thread::sleep(self.delay);
        self.inner.find_and_increment(key, now)
    }

    fn insert(&self, entry: VisionCacheEntry) -> Result<StoreOutcome, CacheError> {
        std::thread::sleep(self.delay);
        self.inner.insert(entry)
    }

    fn peek(&self, key: &CacheKey) -> Result<Option<VisionCacheEntry>, CacheError> {
        self.inner.peek(key)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        self.inner.purge_expired(now)
    }

    fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats, CacheError> {
        self.inner.stats(now)
    }
}

#[tokio::test]
async fn slow_store_does_not_stall_the_runtime_thread() {
    let store = SlowStore {
        inner: MemoryVisionStore::new(),
        delay: Duration::from_millis(150),
    };
    let cached = CachedVisionJudge::new(
        Arc::new(VisionVerdictCache::new(Arc::new(store))),
        Arc::new(CountingJudge::new(true)),
    );

    // single-threaded runtime: the ticker only advances if store calls
    // leave the runtime thread free
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    let judged = cached.judge(b"png-slow", "footer links render").await.unwrap();
    ticker.abort();

    assert!(!judged.cache_hit);
    assert!(ticks.load(Ordering::SeqCst) >= 5);
}
