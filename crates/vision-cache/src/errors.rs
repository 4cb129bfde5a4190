//! Error types for the vision cache and judges
use flowguard_flow_store::StoreError;
use query_guard::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cache storage error: {0}")]
    Storage(#[from] StoreError),

    /// A lookup matched a live entry but the incremented hit count was not
    /// positive. Means the find-and-increment is no longer atomic.
    #[error("hit count invariant violated for {key}: hit_count={hit_count}")]
    InvariantViolation { key: String, hit_count: i64 },

    /// The blocking task running a store call panicked or was cancelled.
    #[error("cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Storage(StoreError::from(err))
    }
}

impl CacheError {
    /// Storage failures may be treated as a miss; the other kinds may not.
    pub fn is_storage(&self) -> bool {
        matches!(self, CacheError::Storage(_) | CacheError::Task(_))
    }
}

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("environment variable {0} holding the API key is not set")]
    MissingApiKey(String),

    #[error("vision request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vision API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unparseable vision response: {0}")]
    InvalidResponse(String),

    #[error("screenshot unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
