//! forge::traits
//!
//! Forge trait definition for reading repository metadata and star history
//! from a remote hosting service.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! Results are converted into the domain model at this boundary: timestamps
//! become UTC calendar dates and slugs are validated [`RepoSlug`]s.
//!
//! A forge failure only affects the reference being resolved. Callers record
//! it and move on.
//!
//! # Example
//!
//! ```ignore
//! use starcast::forge::{Forge, ForgeError};
//! use starcast::core::types::RepoSlug;
//!
//! async fn stars(forge: &dyn Forge) -> Result<usize, ForgeError> {
//!     let slug = RepoSlug::parse("psf/black").unwrap();
//!     let events = forge.fetch_stargazers(&slug).await?;
//!     Ok(events.len())
//! }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::core::model::{Repository, StarGazer};
use crate::core::types::RepoSlug;

/// Errors from forge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested repository was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Repository metadata as reported by the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Canonical slug (may differ in case or after a rename)
    pub slug: RepoSlug,
    /// Web URL
    pub url: String,
    /// Creation date (UTC)
    pub date_created: NaiveDate,
    /// Primary language, if any
    pub primary_language: Option<String>,
    /// Whether the repository is a fork
    pub is_fork: bool,
    /// Total stars at request time
    pub stargazer_count: u64,
}

impl RepositoryInfo {
    /// Combine metadata and star events into a model [`Repository`].
    pub fn into_repository(self, date_requested: NaiveDate, stargazers: Vec<StarGazer>) -> Repository {
        Repository {
            slug: self.slug,
            url: self.url,
            date_created: self.date_created,
            primary_language: self.primary_language,
            is_fork: self.is_fork,
            date_requested,
            stargazer_count: self.stargazer_count,
            manually_modified: None,
            stargazers,
        }
    }
}

/// Interface to a remote forge.
///
/// Implementations must be `Send + Sync` so a single forge can serve a whole
/// resolution run.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Forge name for logs (e.g. "github").
    fn name(&self) -> &'static str;

    /// Fetch repository metadata.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the repository doesn't exist or is not visible
    /// - `AuthFailed` / `RateLimited` / `ApiError` / `NetworkError` otherwise
    async fn fetch_repository(&self, slug: &RepoSlug) -> Result<RepositoryInfo, ForgeError>;

    /// Fetch every star event, oldest first.
    ///
    /// # Errors
    ///
    /// Same as [`Forge::fetch_repository`]. A failure on any page fails the
    /// whole call.
    async fn fetch_stargazers(&self, slug: &RepoSlug) -> Result<Vec<StarGazer>, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_error_display() {
        assert_eq!(
            format!("{}", ForgeError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", ForgeError::NotFound("psf/black".into())),
            "not found: psf/black"
        );
        assert_eq!(format!("{}", ForgeError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                ForgeError::ApiError {
                    status: 502,
                    message: "Bad gateway".into()
                }
            ),
            "API error: 502 - Bad gateway"
        );
    }

    #[test]
    fn into_repository_stamps_request_date() {
        let info = RepositoryInfo {
            slug: RepoSlug::new("psf", "black").unwrap(),
            url: "https://github.com/psf/black".into(),
            date_created: NaiveDate::from_ymd_opt(2018, 3, 14).unwrap(),
            primary_language: Some("Python".into()),
            is_fork: false,
            stargazer_count: 0,
        };
        let requested = NaiveDate::from_ymd_opt(2020, 1, 10).unwrap();
        let repo = info.into_repository(requested, vec![]);
        assert_eq!(repo.date_requested, requested);
        assert_eq!(repo.owner(), "psf");
        assert!(repo.manually_modified.is_none());
    }
}
