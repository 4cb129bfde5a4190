//! Wiring of the long-lived handles a command needs.
//!
//! The database is opened once per process and shared by the flow repository
//! and the verdict cache; both receive it by injection.

use std::sync::Arc;
use std::time::Duration;

use action_flow::{FlowRunner, RepositoryRecorder, RunnerSettings};
use anyhow::{Context, Result};
use cdp_adapter::BrowserLauncher;
use flowguard_flow_store::{Database, FlowRepository};
use flowguard_scheduler::{FlowScheduler, SchedulerConfig};
use tracing::{info, warn};
use vision_cache::{
    AnthropicVisionJudge, CacheSweeper, CachedVisionJudge, SqliteVisionStore, VisionError,
    VisionJudge, VisionVerdictCache,
};

use crate::config::{Config, MAX_TTL_HOURS};

pub struct AppContext {
    config: Config,
    database: Database,
    repository: FlowRepository,
    cache: Arc<VisionVerdictCache>,
}

impl AppContext {
    pub fn open(config: Config) -> Result<Self> {
        let database = Database::open(&config.database_path).with_context(|| {
            format!("Failed to open database at {}", config.database_path.display())
        })?;
        Ok(Self::with_database(config, database))
    }

    pub fn with_database(config: Config, database: Database) -> Self {
        let repository = FlowRepository::new(database.clone());
        let cache = VisionVerdictCache::new(Arc::new(SqliteVisionStore::new(&database)))
            .with_ttl(chrono::Duration::hours(config.vision.ttl_hours.clamp(1, MAX_TTL_HOURS)));
        Self {
            config,
            database,
            repository,
            cache: Arc::new(cache),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &FlowRepository {
        &self.repository
    }

    pub fn cache(&self) -> &Arc<VisionVerdictCache> {
        &self.cache
    }

    /// Cached judge backed by the configured inference service.
    pub fn vision_judge(&self) -> Result<Arc<CachedVisionJudge>, VisionError> {
        let judge = AnthropicVisionJudge::from_env(self.config.vision.anthropic.clone())?;
        Ok(self.cached_judge(Arc::new(judge)))
    }

    pub fn cached_judge(&self, judge: Arc<dyn VisionJudge>) -> Arc<CachedVisionJudge> {
        Arc::new(CachedVisionJudge::new(Arc::clone(&self.cache), judge))
    }

    /// Judge for flow runs: `None` when vision is disabled or unconfigured,
    /// in which case assertions are skipped.
    pub fn optional_vision_judge(&self) -> Option<Arc<CachedVisionJudge>> {
        if !self.config.vision.enabled {
            info!("Vision assertions disabled by configuration");
            return None;
        }
        match self.vision_judge() {
            Ok(judge) => Some(judge),
            Err(err) => {
                warn!(error = %err, "Vision judge unavailable; assertions will be skipped");
                None
            }
        }
    }

    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            output_dir: self.config.output_dir.clone(),
            navigation_timeout: Duration::from_millis(self.config.navigation_timeout_ms),
            default_viewport: self.config.default_viewport,
        }
    }

    /// Runner that records every result in the repository.
    pub fn runner(
        &self,
        launcher: Arc<dyn BrowserLauncher>,
        judge: Option<Arc<CachedVisionJudge>>,
    ) -> FlowRunner {
        let runner = FlowRunner::new(launcher, self.runner_settings())
            .with_recorder(Arc::new(RepositoryRecorder::new(self.repository.clone())));
        match judge {
            Some(judge) => runner.with_judge(judge),
            None => runner,
        }
    }

    pub fn scheduler(&self, runner: FlowRunner, concurrency: usize) -> Result<FlowScheduler> {
        FlowScheduler::new(Arc::new(runner), SchedulerConfig { concurrency })
            .context("Invalid scheduler concurrency")
    }

    /// Background purge of expired verdicts; stop it before closing.
    pub fn start_sweeper(&self) -> CacheSweeper {
        let period = Duration::from_secs(self.config.vision.sweep_interval_secs);
        let mut sweeper = CacheSweeper::new(Arc::clone(&self.cache), period);
        sweeper.start();
        sweeper
    }

    /// Release the database. Handles still held elsewhere keep it open.
    pub fn close(self) -> Result<()> {
        let AppContext {
            database,
            repository,
            cache,
            ..
        } = self;
        drop(repository);
        drop(cache);
        database.close().context("Failed to close database")
    }
}
