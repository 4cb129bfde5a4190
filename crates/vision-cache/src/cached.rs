//! Cache-first vision judging

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::VisionVerdictCache;
use crate::errors::{CacheError, VisionError};
use crate::judge::VisionJudge;
use crate::key::CacheKey;
use crate::models::VisionJudgment;

#[derive(Clone, Debug, PartialEq)]
pub struct CachedJudgment {
    pub judgment: VisionJudgment,
    pub cache_hit: bool,
    /// Hit count after this lookup; 0 for a fresh judgment.
    pub hit_count: u64,
}

/// Consults the cache before paying for inference.
///
/// A live entry short-circuits the judge. A storage failure on lookup is
/// treated as a miss, but validation failures and invariant violations are
/// returned. Failing to store a fresh judgment only logs. Store calls run on
/// the blocking pool since the backing store may be SQLite.
#[derive(Clone)]
pub struct CachedVisionJudge {
    cache: Arc<VisionVerdictCache>,
    judge: Arc<dyn VisionJudge>,
}

impl CachedVisionJudge {
    pub fn new(cache: Arc<VisionVerdictCache>, judge: Arc<dyn VisionJudge>) -> Self {
        Self { cache, judge }
    }

    pub fn cache(&self) -> &Arc<VisionVerdictCache> {
        &self.cache
    }

    pub fn model(&self) -> &str {
        self.judge.model()
    }

    pub async fn judge(&self, screenshot_png: &[u8], assertion: &str) -> Result<CachedJudgment, VisionError> {
        let key = CacheKey::for_screenshot(
            screenshot_png,
            assertion,
            self.judge.model(),
            self.judge.prompt_version(),
        )
        .map_err(CacheError::from)?;

        let cache = Arc::clone(&self.cache);
        let lookup_key = key.clone();
        let cached = tokio::task::spawn_blocking(move || cache.lookup(&lookup_key))
            .await
            .map_err(CacheError::from)
            .and_then(|found| found);
        match cached {
            Ok(Some(entry)) => {
                debug!(key = %key, hit_count = entry.hit_count, "vision verdict served from cache");
                return Ok(CachedJudgment {
                    judgment: entry.judgment,
                    cache_hit: true,
                    hit_count: entry.hit_count,
                });
            }
            Ok(None) => {}
            Err(err) if err.is_storage() => {
                warn!(key = %key, %err, "vision cache lookup failed, judging without cache");
            }
            Err(err) => return Err(err.into()),
        }

        let judgment = self.judge.judge(screenshot_png, assertion).await?;
        let cache = Arc::clone(&self.cache);
        let (store_key, fresh) = (key.clone(), judgment.clone());
        let stored = tokio::task::spawn_blocking(move || cache.store(store_key, fresh))
            .await
            .map_err(CacheError::from)
            .and_then(|outcome| outcome);
        match stored {
            Ok(outcome) => debug!(key = %key, ?outcome, "vision verdict cached"),
            Err(err) => warn!(key = %key, %err, "failed to cache vision verdict"),
        }
        Ok(CachedJudgment {
            judgment,
            cache_hit: false,
            hit_count: 0,
        })
    }
}
