//! SQLite store sharing the FlowGuard database
use chrono::{DateTime, TimeZone, Utc};
use flowguard_flow_store::Database;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tracing::debug;

use super::VisionStore;
use crate::errors::CacheError;
use crate::key::CacheKey;
use crate::models::{CacheStats, StoreOutcome, TokenUsage, VisionCacheEntry, VisionJudgment};

const ENTRY_COLUMNS: &str = "verdict, confidence, reasoning, input_tokens, output_tokens, cost, \
                             created_at, expires_at, hit_count";

/// Entries live in the `vision_cache` table. The lookup is a single
/// `UPDATE ... RETURNING` statement, so the match and the increment happen
/// inside one SQLite write.
#[derive(Clone)]
pub struct SqliteVisionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVisionStore {
    pub fn new(db: &Database) -> Self {
        Self {
            conn: db.connection(),
        }
    }
}

impl VisionStore for SqliteVisionStore {
    fn find_and_increment(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> Result<Option<VisionCacheEntry>, CacheError> {
        let conn = self.conn.lock();
        let sql = format!(
            "UPDATE vision_cache SET hit_count = hit_count + 1
             WHERE screenshot_hash = ?1 AND assertion = ?2 AND model = ?3
               AND prompt_version = ?4 AND expires_at > ?5
             RETURNING {ENTRY_COLUMNS}"
        );
        let entry = conn
            .query_row(
                &sql,
                params![
                    key.screenshot_hash.as_str(),
                    key.assertion.as_str(),
                    key.model.as_str(),
                    key.prompt_version.as_str(),
                    now.timestamp_millis(),
                ],
                |row| read_entry(key, row),
            )
            .optional()?;
        Ok(entry)
    }

    fn insert(&self, entry: VisionCacheEntry) -> Result<StoreOutcome, CacheError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT expires_at FROM vision_cache
                 WHERE screenshot_hash = ?1 AND assertion = ?2 AND model = ?3 AND prompt_version = ?4",
                params![
                    entry.key.screenshot_hash.as_str(),
                    entry.key.assertion.as_str(),
                    entry.key.model.as_str(),
                    entry.key.prompt_version.as_str(),
                ],
                |row| row.get(0),
            )
            .optional()?;

        // the upsert only fires on an expired row, a live row keeps its hits
        let changed = tx.execute(
            "INSERT INTO vision_cache (
                screenshot_hash, assertion, model, prompt_version,
                verdict, confidence, reasoning, input_tokens, output_tokens, cost,
                created_at, expires_at, hit_count
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0)
             ON CONFLICT(screenshot_hash, assertion, model, prompt_version) DO UPDATE SET
                verdict = excluded.verdict,
                confidence = excluded.confidence,
                reasoning = excluded.reasoning,
                input_tokens = excluded.input_tokens,
                output_tokens = excluded.output_tokens,
                cost = excluded.cost,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at,
                hit_count = 0
             WHERE vision_cache.expires_at <= excluded.created_at",
            params![
                entry.key.screenshot_hash.as_str(),
                entry.key.assertion.as_str(),
                entry.key.model.as_str(),
                entry.key.prompt_version.as_str(),
                entry.judgment.verdict,
                entry.judgment.confidence,
                entry.judgment.reasoning,
                entry.judgment.tokens.input as i64,
                entry.judgment.tokens.output as i64,
                entry.judgment.cost,
                entry.created_at.timestamp_millis(),
                entry.expires_at.timestamp_millis(),
            ],
        )?;
        tx.commit()?;

        let outcome = match (existing, changed) {
            (None, _) => StoreOutcome::Inserted,
            (Some(_), 0) => StoreOutcome::AlreadyCached,
            (Some(_), _) => StoreOutcome::Replaced,
        };
        debug!(key = %entry.key, ?outcome, "vision cache insert");
        Ok(outcome)
    }

    fn peek(&self, key: &CacheKey) -> Result<Option<VisionCacheEntry>, CacheError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM vision_cache
             WHERE screenshot_hash = ?1 AND assertion = ?2 AND model = ?3 AND prompt_version = ?4"
        );
        let entry = conn
            .query_row(
                &sql,
                params![
                    key.screenshot_hash.as_str(),
                    key.assertion.as_str(),
                    key.model.as_str(),
                    key.prompt_version.as_str(),
                ],
                |row| read_entry(key, row),
            )
            .optional()?;
        Ok(entry)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let conn = self.conn.lock();
        let purged = conn.execute(
            "DELETE FROM vision_cache WHERE expires_at <= ?1",
            params![now.timestamp_millis()],
        )?;
        Ok(purged)
    }

    fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats, CacheError> {
        let conn = self.conn.lock();
        let (entries, live, hits): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN expires_at > ?1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(hit_count), 0)
             FROM vision_cache",
            params![now.timestamp_millis()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(CacheStats {
            entries: entries.max(0) as u64,
            live: live.max(0) as u64,
            total_hits: hits.max(0) as u64,
        })
    }
}

fn read_entry(key: &CacheKey, row: &Row<'_>) -> rusqlite::Result<VisionCacheEntry> {
    let hit_count: i64 = row.get(8)?;
    Ok(VisionCacheEntry {
        key: key.clone(),
        judgment: VisionJudgment {
            verdict: row.get(0)?,
            confidence: row.get(1)?,
            reasoning: row.get(2)?,
            tokens: TokenUsage {
                input: row.get::<_, i64>(3)?.max(0) as u64,
                output: row.get::<_, i64>(4)?.max(0) as u64,
            },
            cost: row.get(5)?,
        },
        created_at: millis_to_utc(row.get(6)?),
        expires_at: millis_to_utc(row.get(7)?),
        // negative counts are surfaced as zero and rejected by the cache
        hit_count: hit_count.max(0) as u64,
    })
}

fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}
