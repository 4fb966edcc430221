//! core::config::schema
//!
//! Configuration schema types.
//!
//! The global and project files share one schema; a project file simply
//! overrides whatever it sets.
//!
//! # Example
//!
//! ```toml
//! [expand]
//! backfill_days = 365
//! unknown_language = "unknown"
//!
//! [github]
//! api_endpoint = "https://api.github.com/graphql"
//! token_env = "GITHUB_TOKEN"
//! page_size = 100
//!
//! [dataset]
//! days_premention = 365
//! days_postmention = 30
//! recent_episode_days = 31
//! holdout_fraction = 0.2
//! anchor_date = "2019-01-01"
//! ```
//!
//! # Validation
//!
//! Unknown keys are rejected at parse time. Values are range-checked by
//! [`ConfigFile::validate`] after parsing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::dataset::MAX_WINDOW_DAYS;
use crate::expand::MAX_BACKFILL_DAYS;

/// Every settable key, in `section.name` form.
pub const KEYS: &[&str] = &[
    "expand.backfill_days",
    "expand.unknown_language",
    "github.api_endpoint",
    "github.token_env",
    "github.page_size",
    "dataset.days_premention",
    "dataset.days_postmention",
    "dataset.recent_episode_days",
    "dataset.holdout_fraction",
    "dataset.anchor_date",
];

/// One configuration file (global or project scope).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Expansion settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<ExpandSection>,

    /// GitHub access settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubSection>,

    /// Dataset preparation settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<DatasetSection>,
}

/// `[expand]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExpandSection {
    /// Minimum history before the podcast start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backfill_days: Option<i64>,

    /// Sentinel for a missing primary language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_language: Option<String>,
}

/// `[github]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GithubSection {
    /// GraphQL endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,

    /// Environment variable holding the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Stargazers per request (1-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// `[dataset]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_premention: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_postmention: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_episode_days: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub holdout_fraction: Option<f64>,

    /// Shared alignment day, written as a quoted ISO date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_date: Option<NaiveDate>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(expand) = &self.expand {
            in_days_range("expand.backfill_days", expand.backfill_days, MAX_BACKFILL_DAYS)?;
            if let Some(sentinel) = &expand.unknown_language {
                if sentinel.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "expand.unknown_language must not be empty".into(),
                    ));
                }
            }
        }

        if let Some(github) = &self.github {
            if let Some(endpoint) = &github.api_endpoint {
                if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                    return Err(ConfigError::InvalidValue(format!(
                        "github.api_endpoint must be an http(s) URL, got '{}'",
                        endpoint
                    )));
                }
            }
            if let Some(var) = &github.token_env {
                if var.is_empty() || var.contains('=') {
                    return Err(ConfigError::InvalidValue(format!(
                        "github.token_env is not a valid variable name: '{}'",
                        var
                    )));
                }
            }
            if let Some(size) = github.page_size {
                if !(1..=100).contains(&size) {
                    return Err(ConfigError::InvalidValue(format!(
                        "github.page_size must be between 1 and 100, got {}",
                        size
                    )));
                }
            }
        }

        if let Some(dataset) = &self.dataset {
            in_days_range("dataset.days_premention", dataset.days_premention, MAX_WINDOW_DAYS)?;
            in_days_range("dataset.days_postmention", dataset.days_postmention, MAX_WINDOW_DAYS)?;
            in_days_range(
                "dataset.recent_episode_days",
                dataset.recent_episode_days,
                MAX_WINDOW_DAYS,
            )?;
            if let Some(fraction) = dataset.holdout_fraction {
                if !(fraction.is_finite() && (0.0..0.5).contains(&fraction)) {
                    return Err(ConfigError::InvalidValue(format!(
                        "dataset.holdout_fraction must be in [0, 0.5), got {}",
                        fraction
                    )));
                }
            }
        }

        Ok(())
    }

    /// Value of `key` in this file, if set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` for keys not in [`KEYS`].
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let expand = self.expand.as_ref();
        let github = self.github.as_ref();
        let dataset = self.dataset.as_ref();

        Ok(match key {
            "expand.backfill_days" => expand.and_then(|s| s.backfill_days).map(|v| v.to_string()),
            "expand.unknown_language" => expand.and_then(|s| s.unknown_language.clone()),
            "github.api_endpoint" => github.and_then(|s| s.api_endpoint.clone()),
            "github.token_env" => github.and_then(|s| s.token_env.clone()),
            "github.page_size" => github.and_then(|s| s.page_size).map(|v| v.to_string()),
            "dataset.days_premention" => dataset.and_then(|s| s.days_premention).map(|v| v.to_string()),
            "dataset.days_postmention" => {
                dataset.and_then(|s| s.days_postmention).map(|v| v.to_string())
            }
            "dataset.recent_episode_days" => {
                dataset.and_then(|s| s.recent_episode_days).map(|v| v.to_string())
            }
            "dataset.holdout_fraction" => {
                dataset.and_then(|s| s.holdout_fraction).map(|v| v.to_string())
            }
            "dataset.anchor_date" => dataset.and_then(|s| s.anchor_date).map(|v| v.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        })
    }

    /// Parse `value` for `key` and store it, then re-validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` or `ConfigError::InvalidValue`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "expand.backfill_days" => {
                self.expand_mut().backfill_days = Some(parse(key, value)?);
            }
            "expand.unknown_language" => {
                self.expand_mut().unknown_language = Some(value.to_string());
            }
            "github.api_endpoint" => {
                self.github_mut().api_endpoint = Some(value.to_string());
            }
            "github.token_env" => {
                self.github_mut().token_env = Some(value.to_string());
            }
            "github.page_size" => {
                self.github_mut().page_size = Some(parse(key, value)?);
            }
            "dataset.days_premention" => {
                self.dataset_mut().days_premention = Some(parse(key, value)?);
            }
            "dataset.days_postmention" => {
                self.dataset_mut().days_postmention = Some(parse(key, value)?);
            }
            "dataset.recent_episode_days" => {
                self.dataset_mut().recent_episode_days = Some(parse(key, value)?);
            }
            "dataset.holdout_fraction" => {
                self.dataset_mut().holdout_fraction = Some(parse(key, value)?);
            }
            "dataset.anchor_date" => {
                self.dataset_mut().anchor_date = Some(parse(key, value)?);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.validate()
    }

    fn expand_mut(&mut self) -> &mut ExpandSection {
        self.expand.get_or_insert_with(ExpandSection::default)
    }

    fn github_mut(&mut self) -> &mut GithubSection {
        self.github.get_or_insert_with(GithubSection::default)
    }

    fn dataset_mut(&mut self) -> &mut DatasetSection {
        self.dataset.get_or_insert_with(DatasetSection::default)
    }
}

fn in_days_range(key: &str, value: Option<i64>, max: i64) -> Result<(), ConfigError> {
    match value {
        Some(v) if v < 0 => Err(ConfigError::InvalidValue(format!(
            "{} must not be negative, got {}",
            key, v
        ))),
        Some(v) if v > max => Err(ConfigError::InvalidValue(format!(
            "{} must be at most {}, got {}",
            key, max, v
        ))),
        _ => Ok(()),
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("{}: '{}': {}", key, value, e)))
}
