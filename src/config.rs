//! Layered settings: built-in defaults, then an optional config file, then
//! `AGWEATHER_*` environment variables. CLI flags are applied on top by the
//! command layer.

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    CONFIG_BASENAME, DEFAULT_DATABASE, DEFAULT_FILE_PATTERN, DEFAULT_STATS_PAGE_SIZE,
    DEFAULT_WEATHER_DIR, DEFAULT_WEATHER_PAGE_SIZE, DEFAULT_YIELD_DIR, DEFAULT_YIELD_PAGE_SIZE,
    ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PagingSettings {
    #[validate(range(min = 1))]
    pub weather_limit: u32,

    #[validate(range(min = 1))]
    pub yield_limit: u32,

    #[validate(range(min = 1))]
    pub stats_limit: u32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    pub database: PathBuf,
    pub weather_dir: PathBuf,
    pub yield_dir: PathBuf,

    #[validate(length(min = 1))]
    pub file_pattern: String,

    #[validate(range(min = 1, max = 1024))]
    pub max_workers: usize,

    #[validate(nested)]
    pub paging: PagingSettings,
}

impl Settings {
    /// Load settings. With `path` the file must exist; without it an
    /// `agweather.{toml,json,yaml,ini}` in the working directory is used if
    /// present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(CONFIG_BASENAME).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("database", DEFAULT_DATABASE)?
            .set_default("weather_dir", DEFAULT_WEATHER_DIR)?
            .set_default("yield_dir", DEFAULT_YIELD_DIR)?
            .set_default("file_pattern", DEFAULT_FILE_PATTERN)?
            .set_default("max_workers", num_cpus::get() as i64)?
            .set_default("paging.weather_limit", i64::from(DEFAULT_WEATHER_PAGE_SIZE))?
            .set_default("paging.yield_limit", i64::from(DEFAULT_YIELD_PAGE_SIZE))?
            .set_default("paging.stats_limit", i64::from(DEFAULT_STATS_PAGE_SIZE))?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn with_database(mut self, database: Option<PathBuf>) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        self
    }

    /// Apply command-line overrides for a refresh or validate run
    pub fn with_sources(
        mut self,
        weather_dir: Option<PathBuf>,
        yield_dir: Option<PathBuf>,
        file_pattern: Option<String>,
        max_workers: Option<usize>,
    ) -> Result<Self> {
        if let Some(dir) = weather_dir {
            self.weather_dir = dir;
        }
        if let Some(dir) = yield_dir {
            self.yield_dir = dir;
        }
        if let Some(pattern) = file_pattern {
            self.file_pattern = pattern;
        }
        if let Some(workers) = max_workers {
            self.max_workers = workers;
        }

        self.validate()
            .map_err(|e| ProcessingError::Config(format!("Invalid override: {}", e)))?;
        Ok(self)
    }
}
