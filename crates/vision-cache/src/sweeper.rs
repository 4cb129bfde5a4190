//! Background eviction of expired verdicts
use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::VisionVerdictCache;

/// Periodically purges expired entries. Lookups never depend on it having
/// run; it only reclaims space.
pub struct CacheSweeper {
    cache: Arc<VisionVerdictCache>,
    period: Duration,
    task: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl CacheSweeper {
    pub fn new(cache: Arc<VisionVerdictCache>, period: Duration) -> Self {
        Self {
            cache,
            period,
            task: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn start(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }

        let cache = Arc::clone(&self.cache);
        let shutdown = self.shutdown.clone();
        let period = self.period;

        self.task = Some(tokio::spawn(async move {
            debug!(target: "vision-cache", period_ms = period.as_millis() as u64, "sweeper started");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                select! {
                    _ = shutdown.cancelled() => {
                        debug!(target: "vision-cache", "sweeper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let cache = Arc::clone(&cache);
                        match tokio::task::spawn_blocking(move || cache.purge_expired()).await {
                            Ok(Ok(_)) => {}
                            Ok(Err(err)) => warn!(target: "vision-cache", %err, "sweep failed"),
                            Err(err) => warn!(target: "vision-cache", %err, "sweep task aborted"),
                        }
                    }
                }
            }
        }));
    }

    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.task.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::key::CacheKey;
    use crate::models::{TokenUsage, VisionJudgment};
    use crate::store::MemoryVisionStore;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sweeper_purges_expired_entries() {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(
            VisionVerdictCache::new(Arc::new(MemoryVisionStore::new()))
                .with_clock(clock.clone())
                .with_ttl(chrono::Duration::seconds(10)),
        );
        let key = CacheKey::new("h1", "a1", "m1", "v1").unwrap();
        let judgment = VisionJudgment {
            verdict: true,
            confidence: 90.0,
            reasoning: String::new(),
            tokens: TokenUsage::default(),
            cost: 0.0,
        };
        cache.store(key.clone(), judgment).unwrap();
        clock.advance(chrono::Duration::seconds(11));

        let mut sweeper = CacheSweeper::new(Arc::clone(&cache), Duration::from_millis(10));
        sweeper.start();
        for _ in 0..100 {
            if cache.peek(&key).unwrap().is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        sweeper.stop().await;

        assert!(cache.peek(&key).unwrap().is_none());
    }
}
