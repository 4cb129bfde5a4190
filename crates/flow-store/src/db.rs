//! SQLite database handle

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::Result;

/// Shared connection to the FlowGuard database.
///
/// Cloning is cheap; all clones share one connection. Statements run under
/// the connection mutex, so each call is serialised against the others.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        // WAL lets the CLI read while a run is writing
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;

        info!("Opened database at {:?}", path);
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Expose the connection to components that keep their own tables in
    /// this database.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Close the connection. If other handles are still alive the
    /// connection stays open until the last one is dropped.
    pub fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                mutex.into_inner().close().map_err(|(_, err)| err)?;
                debug!("Database closed");
                Ok(())
            }
            Err(_) => {
                warn!("Database close requested while other handles are alive");
                Ok(())
            }
        }
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Flow definitions, keyed by name
            CREATE TABLE IF NOT EXISTS flows (
                name TEXT PRIMARY KEY,
                intent TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL,
                definition TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- One row per orchestrated run
            CREATE TABLE IF NOT EXISTS flow_runs (
                run_id TEXT PRIMARY KEY,
                flow_name TEXT NOT NULL,
                verdict TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                started_at INTEGER NOT NULL,
                completed_at INTEGER NOT NULL,
                result TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_flow_runs_flow
                ON flow_runs(flow_name, started_at DESC);

            -- Vision verdicts, content addressed
            CREATE TABLE IF NOT EXISTS vision_cache (
                screenshot_hash TEXT NOT NULL,
                assertion TEXT NOT NULL,
                model TEXT NOT NULL,
                prompt_version TEXT NOT NULL,
                verdict INTEGER NOT NULL,
                confidence REAL NOT NULL,
                reasoning TEXT NOT NULL,
                input_tokens INTEGER NOT NULL,
                output_tokens INTEGER NOT NULL,
                cost REAL NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                hit_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (screenshot_hash, assertion, model, prompt_version)
            );
            CREATE INDEX IF NOT EXISTS idx_vision_cache_expires
                ON vision_cache(expires_at);
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("flowguard.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        db.close().unwrap();
    }

    #[test]
    fn schema_is_idempotent() {
        let db = Database::open_memory().unwrap();
        db.init_schema().unwrap();
        let count: i64 = db
            .connection()
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
