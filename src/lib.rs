pub mod adapter;
pub mod collection;
pub mod config;
pub mod errors;
pub mod logger;
pub mod query;
pub mod repository;
pub mod transform;
pub mod types;
pub mod utils;

pub use crate::adapter::{Adapter, MemoryAdapter, OpResult, RemoteAdapter};
pub use crate::collection::Collection;
pub use crate::config::Config;
pub use crate::errors::{DbError, Errors};
pub use crate::query::{Criterion, Query, Selector};
pub use crate::repository::Repository;
pub use crate::transform::{FieldRename, Identity, Transform};

use std::path::Path;

/// Loads configuration (file, then `NEXUS_QUERY_*` overrides), installs the
/// query limits and starts logging.
///
/// With no path the defaults are used.
///
/// # Errors
/// Returns config read/parse errors or logger setup failures.
pub fn init(config_path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let cfg = match config_path {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    }
    .with_env_overrides();
    config::install(&cfg);
    logger::init_from_config(&cfg.logging)?;
    Ok(cfg)
}
