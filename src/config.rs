//! Application configuration.
//!
//! Loaded from YAML, filled with defaults for every missing key, then
//! overridden by `FLOWGUARD_*` environment variables. CLI flags are applied
//! last by the command handlers.

use std::path::{Path, PathBuf};

use cdp_adapter::BrowserConfig;
use flowguard_core_types::Viewport;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vision_cache::{AnthropicConfig, DEFAULT_TTL_HOURS};

pub const ENV_PREFIX: &str = "FLOWGUARD_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidOverride { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory for per-run screenshot folders.
    pub output_dir: PathBuf,
    /// Maximum number of flows (and browser sessions) in flight.
    pub concurrency: usize,
    pub navigation_timeout_ms: u64,
    pub default_viewport: Viewport,
    pub database_path: PathBuf,
    pub browser: BrowserConfig,
    pub vision: VisionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test-results"),
            concurrency: flowguard_scheduler::DEFAULT_CONCURRENCY,
            navigation_timeout_ms: action_flow::DEFAULT_NAVIGATION_TIMEOUT_MS,
            default_viewport: Viewport::default(),
            database_path: default_database_path(),
            browser: BrowserConfig::default(),
            vision: VisionSettings::default(),
        }
    }
}

/// Upper bound for `vision.ttl_hours`: one year.
pub const MAX_TTL_HOURS: i64 = 24 * 365;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub enabled: bool,
    #[serde(flatten)]
    pub anthropic: AnthropicConfig,
    pub ttl_hours: i64,
    /// Seconds between background purges of expired verdicts.
    pub sweep_interval_secs: u64,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            anthropic: AnthropicConfig::default(),
            ttl_hours: DEFAULT_TTL_HOURS,
            sweep_interval_secs: 300,
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("flowguard").join("flowguard.db"))
        .unwrap_or_else(|| PathBuf::from("flowguard.db"))
}

impl Config {
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        // an empty file is a valid, all-defaults config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `FLOWGUARD_*` overrides read through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let key = format!("{ENV_PREFIX}{suffix}");
            lookup(&key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(|value| (key, value))
        };

        if let Some((_, value)) = var("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
        }
        if let Some((key, value)) = var("CONCURRENCY") {
            self.concurrency = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = var("NAVIGATION_TIMEOUT_MS") {
            self.navigation_timeout_ms = parse_number(&key, &value)?;
        }
        if let Some((_, value)) = var("DATABASE_PATH") {
            self.database_path = PathBuf::from(value);
        }
        if let Some((key, value)) = var("VISION_ENABLED") {
            self.vision.enabled = parse_flag(&key, &value)?;
        }
        if let Some((_, value)) = var("VISION_MODEL") {
            self.vision.anthropic.model = value;
        }
        if let Some((_, value)) = var("VISION_ENDPOINT") {
            self.vision.anthropic.endpoint = value;
        }
        if let Some((key, value)) = var("CACHE_TTL_HOURS") {
            self.vision.ttl_hours = parse_number(&key, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.navigation_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "navigation_timeout_ms must be positive".into(),
            ));
        }
        if self.vision.ttl_hours <= 0 || self.vision.ttl_hours > MAX_TTL_HOURS {
            return Err(ConfigError::Invalid(format!(
                "vision.ttl_hours must be between 1 and {MAX_TTL_HOURS}, got {}",
                self.vision.ttl_hours
            )));
        }
        if self.vision.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "vision.sweep_interval_secs must be positive".into(),
            ));
        }
        self.default_viewport
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("default_viewport: {err}")))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
