//! Persistence backends for cached verdicts.

mod memory;
mod sqlite;

pub use memory::MemoryVisionStore;
pub use sqlite::SqliteVisionStore;

use chrono::{DateTime, Utc};

use crate::errors::CacheError;
use crate::key::CacheKey;
use crate::models::{CacheStats, StoreOutcome, VisionCacheEntry};

/// Backend contract.
///
/// `find_and_increment` must match the key, check liveness and bump the
/// hit count as one indivisible operation: `C` concurrent calls on a live
/// key raise its count by exactly `C`. A miss mutates nothing.
///
/// `insert` is a separate path and never touches the hit count of a live
/// entry.
pub trait VisionStore: Send + Sync {
    fn find_and_increment(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> Result<Option<VisionCacheEntry>, CacheError>;

    /// Keep-first while live: a live entry under the key wins, an expired
    /// one is replaced. `entry.created_at` is the reference time.
    fn insert(&self, entry: VisionCacheEntry) -> Result<StoreOutcome, CacheError>;

    /// Read without counting a hit, expired entries included.
    fn peek(&self, key: &CacheKey) -> Result<Option<VisionCacheEntry>, CacheError>;

    /// Delete entries whose `expires_at` is at or before `now`.
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError>;

    fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats, CacheError>;
}
