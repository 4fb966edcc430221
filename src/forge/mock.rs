//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge stores repositories and their star events in memory and
//! allows configuring failure scenarios per operation or per repository.
//! Every call is recorded for later verification.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use starcast::core::types::RepoSlug;
//! use starcast::forge::mock::MockForge;
//! use starcast::forge::{Forge, RepositoryInfo};
//!
//! # tokio_test::block_on(async {
//! let slug = RepoSlug::parse("psf/black").unwrap();
//! let forge = MockForge::new().with_repository(
//!     RepositoryInfo {
//!         slug: slug.clone(),
//!         url: slug.url(),
//!         date_created: NaiveDate::from_ymd_opt(2018, 3, 14).unwrap(),
//!         primary_language: Some("Python".into()),
//!         is_fork: false,
//!         stargazer_count: 0,
//!     },
//!     vec![],
//! );
//!
//! let info = forge.fetch_repository(&slug).await.unwrap();
//! assert_eq!(info.primary_language.as_deref(), Some("Python"));
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::traits::{Forge, ForgeError, RepositoryInfo};
use crate::core::model::StarGazer;
use crate::core::types::RepoSlug;

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockForgeInner {
    /// Stored repositories by slug.
    repositories: HashMap<RepoSlug, (RepositoryInfo, Vec<StarGazer>)>,
    /// Failures to inject.
    fail_on: Vec<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail every fetch_repository call.
    FetchRepository(ForgeError),
    /// Fail every fetch_stargazers call.
    FetchStargazers(ForgeError),
    /// Fail every call for one repository.
    Repository(RepoSlug, ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    FetchRepository { slug: RepoSlug },
    FetchStargazers { slug: RepoSlug },
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner::default())),
        }
    }

    /// Add a repository with its star events.
    pub fn with_repository(self, info: RepositoryInfo, stargazers: Vec<StarGazer>) -> Self {
        self.state()
            .repositories
            .insert(info.slug.clone(), (info, stargazers));
        self
    }

    /// Configure a failure.
    ///
    /// # Example
    ///
    /// ```
    /// use starcast::forge::mock::{MockForge, FailOn};
    /// use starcast::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::FetchStargazers(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on.push(fail_on);
        self
    }

    /// Clear all failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Number of stored repositories.
    pub fn repository_count(&self) -> usize {
        self.state().repositories.len()
    }

    fn state(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    /// Find an injected failure matching this call.
    fn check_fail(&self, slug: &RepoSlug, stargazers: bool) -> Option<ForgeError> {
        self.state().fail_on.iter().find_map(|f| match f {
            FailOn::FetchRepository(e) if !stargazers => Some(e.clone()),
            FailOn::FetchStargazers(e) if stargazers => Some(e.clone()),
            FailOn::Repository(s, e) if s == slug => Some(e.clone()),
            _ => None,
        })
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_repository(&self, slug: &RepoSlug) -> Result<RepositoryInfo, ForgeError> {
        self.record(MockOperation::FetchRepository { slug: slug.clone() });

        if let Some(e) = self.check_fail(slug, false) {
            return Err(e);
        }

        self.state()
            .repositories
            .get(slug)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| ForgeError::NotFound(slug.to_string()))
    }

    async fn fetch_stargazers(&self, slug: &RepoSlug) -> Result<Vec<StarGazer>, ForgeError> {
        self.record(MockOperation::FetchStargazers { slug: slug.clone() });

        if let Some(e) = self.check_fail(slug, true) {
            return Err(e);
        }

        let mut events = self
            .state()
            .repositories
            .get(slug)
            .map(|(_, events)| events.clone())
            .ok_or_else(|| ForgeError::NotFound(slug.to_string()))?;
        events.sort_by_key(|e| e.date_starred);
        Ok(events)
    }
}
