//! Vision verdict cache.
//!
//! Judging a screenshot against a natural-language assertion is slow and
//! billed per token. Verdicts are cached under the compound key
//! `(screenshot hash, assertion, model, prompt version)` for a TTL, and
//! every lookup that finds a live entry bumps its hit count in the same
//! atomic store operation that matched it.

pub mod anthropic;
pub mod cache;
pub mod cached;
pub mod clock;
pub mod errors;
pub mod judge;
pub mod key;
pub mod models;
pub mod store;
pub mod sweeper;

pub use anthropic::{AnthropicConfig, AnthropicVisionJudge};
pub use cache::{VisionVerdictCache, DEFAULT_TTL_HOURS};
pub use cached::{CachedJudgment, CachedVisionJudge};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{CacheError, VisionError};
pub use judge::VisionJudge;
pub use key::{screenshot_hash, CacheKey};
pub use models::{CacheStats, StoreOutcome, TokenUsage, VisionCacheEntry, VisionJudgment};
pub use store::{MemoryVisionStore, SqliteVisionStore, VisionStore};
pub use sweeper::CacheSweeper;
