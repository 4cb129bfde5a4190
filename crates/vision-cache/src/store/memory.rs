//! In-process store backed by a sharded map
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::VisionStore;
use crate::errors::CacheError;
use crate::key::CacheKey;
use crate::models::{CacheStats, StoreOutcome, VisionCacheEntry};

/// The shard write lock taken by `get_mut` covers the liveness check and
/// the increment, which makes the lookup atomic.
#[derive(Clone, Default)]
pub struct MemoryVisionStore {
    entries: Arc<DashMap<CacheKey, VisionCacheEntry>>,
}

impl MemoryVisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VisionStore for MemoryVisionStore {
    fn find_and_increment(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> Result<Option<VisionCacheEntry>, CacheError> {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(None);
        };
        if !entry.is_live(now) {
            return Ok(None);
        }
        entry.hit_count += 1;
        Ok(Some(entry.clone()))
    }

    fn insert(&self, entry: VisionCacheEntry) -> Result<StoreOutcome, CacheError> {
        let now = entry.created_at;
        match self.entries.entry(entry.key.clone()) {
            Entry::Occupied(mut existing) => {
                if existing.get().is_live(now) {
                    Ok(StoreOutcome::AlreadyCached)
                } else {
                    existing.insert(entry);
                    Ok(StoreOutcome::Replaced)
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(StoreOutcome::Inserted)
            }
        }
    }

    fn peek(&self, key: &CacheKey) -> Result<Option<VisionCacheEntry>, CacheError> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut purged = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.is_live(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        Ok(purged)
    }

    fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats, CacheError> {
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            stats.entries += 1;
            if entry.is_live(now) {
                stats.live += 1;
            }
            stats.total_hits += entry.hit_count;
        }
        Ok(stats)
    }
}
