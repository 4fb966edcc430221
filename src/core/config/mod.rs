//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! starcast has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Overrides for one working directory
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$STARCAST_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/starcast/config.toml`
//! 3. `~/.starcast/config.toml` (canonical write location)
//!
//! # Project Config Locations
//!
//! Searched in order:
//! 1. `.starcast/config.toml` (canonical)
//! 2. `starcast.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use starcast::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let config = result.config;
//!
//! println!("Backfill: {} days", config.backfill_days());
//! println!("Endpoint: {}", config.api_endpoint());
//! ```

pub mod schema;

pub use schema::{ConfigFile, DatasetSection, ExpandSection, GithubSection, KEYS};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::dataset::{DatasetOptions, WindowOptions, DEFAULT_HOLDOUT_FRACTION};
use crate::expand::{ExpandOptions, DEFAULT_BACKFILL_DAYS, DEFAULT_UNKNOWN_LANGUAGE};
use crate::forge::github::{DEFAULT_GRAPHQL_ENDPOINT, MAX_PAGE_SIZE};

/// Environment variable read for the GitHub token unless configured.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Which file a write goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Project,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence: project over global over defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Project configuration (if found)
    pub project: Option<ConfigFile>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads project config from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(&Self::global_candidates(), project_dir)
    }

    /// Load using an explicit list of global candidates (first existing wins).
    pub fn load_from(
        global_candidates: &[PathBuf],
        project_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = match global_candidates.iter().find(|p| p.exists()) {
            Some(path) => (Self::read_config(path)?, Some(path.clone())),
            None => (ConfigFile::default(), None),
        };

        let (project, project_path) = match project_dir {
            Some(dir) => Self::load_project(dir, &mut warnings)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                global_path,
                project_path,
            },
            warnings,
        })
    }

    /// Global config locations in search order.
    pub fn global_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(path) = std::env::var("STARCAST_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("starcast/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".starcast/config.toml"));
        }

        candidates
    }

    /// Load project configuration from standard locations.
    fn load_project(
        dir: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(Option<ConfigFile>, Option<PathBuf>), ConfigError> {
        // 1. Check .starcast/config.toml (canonical)
        let canonical = Self::project_config_path(dir);
        if canonical.exists() {
            let config = Self::read_config(&canonical)?;
            return Ok((Some(config), Some(canonical)));
        }

        // 2. Check starcast.toml (compatibility)
        let compat = dir.join("starcast.toml");
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please move to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            let config = Self::read_config(&compat)?;
            return Ok((Some(config), Some(compat)));
        }

        Ok((None, None))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.starcast/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".starcast/config.toml"))
    }

    /// Get the canonical path for project config.
    ///
    /// Returns `.starcast/config.toml` relative to the given directory.
    pub fn project_config_path(dir: &Path) -> PathBuf {
        dir.join(".starcast/config.toml")
    }

    /// Where a write to `scope` should go: the file already loaded for that
    /// scope, or its canonical location.
    pub fn write_target(&self, scope: Scope, project_dir: &Path) -> Result<PathBuf, ConfigError> {
        match scope {
            Scope::Global => match &self.global_path {
                Some(path) => Ok(path.clone()),
                None => Self::global_config_path(),
            },
            Scope::Project => Ok(self
                .project_path
                .clone()
                .unwrap_or_else(|| Self::project_config_path(project_dir))),
        }
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed. Writes to a temp file in the
    /// same directory, then renames over the target.
    pub fn write_atomic(path: &Path, config: &ConfigFile) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// First value set, looking at the project file before the global one.
    fn pick<T>(&self, field: impl Fn(&ConfigFile) -> Option<T>) -> Option<T> {
        self.project
            .as_ref()
            .and_then(&field)
            .or_else(|| field(&self.global))
    }

    /// Effective value of `key` as text, defaults applied.
    pub fn effective(&self, key: &str) -> Result<String, ConfigError> {
        Ok(match key {
            "expand.backfill_days" => self.backfill_days().to_string(),
            "expand.unknown_language" => self.unknown_language(),
            "github.api_endpoint" => self.api_endpoint(),
            "github.token_env" => self.token_env(),
            "github.page_size" => self.page_size().to_string(),
            "dataset.days_premention" => self.window_options().days_premention.to_string(),
            "dataset.days_postmention" => self.window_options().days_postmention.to_string(),
            "dataset.recent_episode_days" => self.window_options().recent_episode_days.to_string(),
            "dataset.holdout_fraction" => self.holdout_fraction().to_string(),
            "dataset.anchor_date" => self.window_options().anchor_date.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        })
    }

    /// Days of history before the podcast start.
    ///
    /// Defaults to 365.
    pub fn backfill_days(&self) -> i64 {
        self.pick(|c| c.expand.as_ref().and_then(|s| s.backfill_days))
            .unwrap_or(DEFAULT_BACKFILL_DAYS)
    }

    /// Sentinel for a missing primary language.
    ///
    /// Defaults to "unknown".
    pub fn unknown_language(&self) -> String {
        self.pick(|c| c.expand.as_ref().and_then(|s| s.unknown_language.clone()))
            .unwrap_or_else(|| DEFAULT_UNKNOWN_LANGUAGE.to_string())
    }

    /// GraphQL endpoint.
    pub fn api_endpoint(&self) -> String {
        self.pick(|c| c.github.as_ref().and_then(|s| s.api_endpoint.clone()))
            .unwrap_or_else(|| DEFAULT_GRAPHQL_ENDPOINT.to_string())
    }

    /// Name of the environment variable holding the token.
    ///
    /// Defaults to `GITHUB_TOKEN`.
    pub fn token_env(&self) -> String {
        self.pick(|c| c.github.as_ref().and_then(|s| s.token_env.clone()))
            .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string())
    }

    /// Stargazers per GraphQL page.
    pub fn page_size(&self) -> u32 {
        self.pick(|c| c.github.as_ref().and_then(|s| s.page_size))
            .unwrap_or(MAX_PAGE_SIZE)
    }

    /// Holdout fraction for partitioning.
    ///
    /// Defaults to 0.2.
    pub fn holdout_fraction(&self) -> f64 {
        self.pick(|c| c.dataset.as_ref().and_then(|s| s.holdout_fraction))
            .unwrap_or(DEFAULT_HOLDOUT_FRACTION)
    }

    pub fn expand_options(&self) -> ExpandOptions {
        ExpandOptions {
            backfill_days: self.backfill_days(),
            unknown_language: self.unknown_language(),
        }
    }

    pub fn window_options(&self) -> WindowOptions {
        let defaults = WindowOptions::default();
        let dataset = |f: fn(&DatasetSection) -> Option<i64>| {
            self.pick(|c| c.dataset.as_ref().and_then(f))
        };
        WindowOptions {
            days_premention: dataset(|s| s.days_premention).unwrap_or(defaults.days_premention),
            days_postmention: dataset(|s| s.days_postmention).unwrap_or(defaults.days_postmention),
            recent_episode_days: dataset(|s| s.recent_episode_days)
                .unwrap_or(defaults.recent_episode_days),
            anchor_date: self
                .pick(|c| c.dataset.as_ref().and_then(|s| s.anchor_date))
                .unwrap_or(defaults.anchor_date),
        }
    }

    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            expand: self.expand_options(),
            window: self.window_options(),
            holdout_fraction: self.holdout_fraction(),
        }
    }

    /// Anchor date if explicitly configured.
    pub fn anchor_date(&self) -> Option<NaiveDate> {
        self.pick(|c| c.dataset.as_ref().and_then(|s| s.anchor_date))
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}
