//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`RepoSlug`] - Validated `owner/name` pair identifying a GitHub repository
//!
//! # Validation
//!
//! These types enforce validity at construction time. A slug that cannot be
//! represented on GitHub never reaches the forge or the expansion engine.
//!
//! # Examples
//!
//! ```
//! use starcast::core::types::RepoSlug;
//!
//! let slug = RepoSlug::new("tiangolo", "fastapi").unwrap();
//! assert_eq!(slug.to_string(), "tiangolo/fastapi");
//!
//! let parsed = RepoSlug::from_url("https://github.com/tiangolo/fastapi/issues/12").unwrap();
//! assert_eq!(parsed, slug);
//!
//! assert!(RepoSlug::new("", "fastapi").is_err());
//! assert!(RepoSlug::from_url("https://pypi.org/project/fastapi").is_none());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository owner: {0}")]
    InvalidOwner(String),

    #[error("invalid repository name: {0}")]
    InvalidRepoName(String),

    #[error("invalid repository slug: {0}")]
    InvalidSlug(String),
}

/// A validated GitHub repository identifier (`owner/name`).
///
/// Both halves must be non-empty and consist of ASCII alphanumerics,
/// `-`, `_` or `.`. The name cannot be `.` or `..`.
///
/// Serializes as the `owner/name` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoSlug {
    owner: String,
    name: String,
}

impl RepoSlug {
    /// Create a new validated slug.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOwner` / `TypeError::InvalidRepoName` if
    /// either half contains characters GitHub does not allow.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, TypeError> {
        let owner = owner.into();
        let name = name.into();

        if owner.is_empty() || !owner.chars().all(is_slug_char) {
            return Err(TypeError::InvalidOwner(owner));
        }
        if name.is_empty() || name == "." || name == ".." || !name.chars().all(is_slug_char) {
            return Err(TypeError::InvalidRepoName(name));
        }

        Ok(Self { owner, name })
    }

    /// Parse an `owner/name` string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSlug` if the string has no single `/`
    /// separator, or the halves fail validation.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s.split_once('/') {
            Some((owner, name)) if !name.contains('/') => Self::new(owner, name),
            _ => Err(TypeError::InvalidSlug(s.to_string())),
        }
    }

    /// Extract a slug from a URL that points into a GitHub repository.
    ///
    /// Accepts `http(s)://[www.]github.com/<owner>/<name>[/...]` and
    /// `git@github.com:<owner>/<name>[.git]`. Anything after the repository
    /// segment (paths, query, fragment) is ignored and a trailing `.git` is
    /// stripped. Hosts other than `github.com` (including `gist.github.com`)
    /// yield `None`.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim();

        let rest = if let Some(rest) = url.strip_prefix("git@github.com:") {
            rest
        } else {
            let without_scheme = url
                .strip_prefix("https://")
                .or_else(|| url.strip_prefix("http://"))
                .unwrap_or(url);
            let without_www = without_scheme
                .strip_prefix("www.")
                .unwrap_or(without_scheme);
            without_www.strip_prefix("github.com/")?
        };

        let mut segments = rest.split('/');
        let owner = leading_slug_chars(segments.next()?);
        let name = leading_slug_chars(segments.next()?);
        let name = name.strip_suffix(".git").unwrap_or(name);

        Self::new(owner, name).ok()
    }

    /// Repository owner (user or organization).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical web URL for the repository.
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Longest prefix of `segment` made of slug characters.
fn leading_slug_chars(segment: &str) -> &str {
    let end = segment
        .find(|c: char| !is_slug_char(c))
        .unwrap_or(segment.len());
    &segment[..end]
}

impl TryFrom<String> for RepoSlug {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RepoSlug> for String {
    fn from(slug: RepoSlug) -> Self {
        slug.to_string()
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Signed number of calendar days from `reference` to `date`.
///
/// Negative when `date` precedes `reference`.
pub fn days_between(date: NaiveDate, reference: NaiveDate) -> i64 {
    date.signed_duration_since(reference).num_days()
}
