use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::CacheKey;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// What the vision service decided about one screenshot and assertion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisionJudgment {
    pub verdict: bool,
    /// 0 to 100.
    pub confidence: f64,
    pub reasoning: String,
    pub tokens: TokenUsage,
    /// USD.
    pub cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionCacheEntry {
    #[serde(flatten)]
    pub key: CacheKey,
    #[serde(flatten)]
    pub judgment: VisionJudgment,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hit_count: u64,
}

impl VisionCacheEntry {
    /// A fresh entry; never counted as a hit.
    pub fn fresh(
        key: CacheKey,
        judgment: VisionJudgment,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            key,
            judgment,
            created_at: now,
            expires_at: now + ttl,
            hit_count: 0,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Result of [`VisionVerdictCache::store`](crate::VisionVerdictCache::store).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOutcome {
    Inserted,
    /// An expired entry under the same key was overwritten.
    Replaced,
    /// A live entry already holds the key and was left untouched.
    AlreadyCached,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: u64,
    pub live: u64,
    pub total_hits: u64,
}

impl CacheStats {
    pub fn expired(&self) -> u64 {
        self.entries.saturating_sub(self.live)
    }
}
