//! Runtime configuration: logging and query guard rails.
//!
//! Values come from a TOML file (`Config::load`), then environment overrides
//! (`Config::with_env_overrides`). `install` makes the query section the active
//! process-wide settings read by selector construction and execution.

use crate::errors::DbError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub(crate) const DEFAULT_MAX_PATH_DEPTH: usize = 32;
pub(crate) const DEFAULT_MAX_IN_SET: usize = 1000;
pub(crate) const DEFAULT_SLOW_QUERY_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub level: String,
    pub retention: usize,
    pub dev6: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: None, level: "info".into(), retention: 7, dev6: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Executions slower than this are logged at warn level.
    pub slow_query_ms: u64,
    /// Deepest nesting accepted in a selector.
    pub max_path_depth: usize,
    /// Largest `__in` / `__nin` argument accepted in a selector.
    pub max_in_set: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            slow_query_ms: DEFAULT_SLOW_QUERY_MS,
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
            max_in_set: DEFAULT_MAX_IN_SET,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub query: QueryConfig,
}

impl Config {
    /// # Errors
    /// Returns `DbError::Config` if the text is not valid TOML for this structure.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        toml::from_str(s).map_err(|e| DbError::Config(e.to_string()))
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DbError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DbError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Applies `NEXUS_QUERY_*` environment overrides on top of `self`.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|k| std::env::var(k).ok())
    }

    fn with_overrides(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = get("NEXUS_QUERY_SLOW_QUERY_MS").and_then(|s| s.parse().ok()) {
            self.query.slow_query_ms = ms;
        }
        if let Some(n) = get("NEXUS_QUERY_MAX_IN_SET").and_then(|s| s.parse().ok()) {
            self.query.max_in_set = n;
        }
        if let Some(n) = get("NEXUS_QUERY_MAX_PATH_DEPTH").and_then(|s| s.parse().ok()) {
            self.query.max_path_depth = n;
        }
        if let Some(dir) = get("NEXUS_QUERY_LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = get("NEXUS_QUERY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(n) = get("NEXUS_QUERY_LOG_RETENTION").and_then(|s| s.parse().ok()) {
            self.logging.retention = n;
        }
        if let Some(v) = get("NEXUS_QUERY_DEV6") {
            self.logging.dev6 = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }
}

static ACTIVE: LazyLock<RwLock<QueryConfig>> = LazyLock::new(|| RwLock::new(QueryConfig::default()));

/// Installs `cfg.query` as the active query settings.
pub fn install(cfg: &Config) {
    *ACTIVE.write() = cfg.query.clone();
    log::info!(
        "query config installed: slow_query_ms={} max_path_depth={} max_in_set={}",
        cfg.query.slow_query_ms,
        cfg.query.max_path_depth,
        cfg.query.max_in_set
    );
}

/// Snapshot of the active query settings.
#[must_use]
pub fn query_config() -> QueryConfig {
    ACTIVE.read().clone()
}
