//! forge::resolve
//!
//! Attaches repository snapshots to a podcast's GitHub references.
//!
//! For every reference that points into a GitHub repository and has no
//! repository yet, the forge is asked for metadata and the full star
//! history. Results are cached per slug, so a repository mentioned in many
//! episodes is fetched once. A failed fetch leaves the reference unresolved
//! and is recorded in the [`ResolveReport`]; the run continues.
//!
//! Before fetching, duplicate episodes (same number and publication date)
//! and duplicate references within an episode (same URL) are dropped.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::traits::{Forge, ForgeError};
use crate::core::model::{Podcast, Repository};
use crate::core::types::RepoSlug;

/// A reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveFailure {
    pub episode: u32,
    pub slug: RepoSlug,
    pub error: ForgeError,
}

/// A repository whose fetched star events disagree with its star count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMismatch {
    pub slug: RepoSlug,
    pub reported: u64,
    pub fetched: usize,
}

/// What a resolution run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// References that received a repository in this run
    pub resolved: usize,
    /// References that already carried a repository
    pub already_resolved: usize,
    /// References served from the per-run cache
    pub cache_hits: usize,
    /// Distinct repositories requested from the forge
    pub fetched: usize,
    pub episodes_deduplicated: usize,
    pub references_deduplicated: usize,
    pub duplicate_stars_dropped: usize,
    pub count_mismatches: Vec<CountMismatch>,
    pub failures: Vec<ResolveFailure>,
}

impl ResolveReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Resolve every unresolved GitHub reference in `podcast`.
///
/// `requested_on` becomes each new repository's `date_requested`.
pub async fn resolve_podcast(
    mut podcast: Podcast,
    forge: &dyn Forge,
    requested_on: NaiveDate,
) -> (Podcast, ResolveReport) {
    let mut report = ResolveReport {
        episodes_deduplicated: podcast.dedup_episodes(),
        ..ResolveReport::default()
    };
    if report.episodes_deduplicated > 0 {
        warn!(
            removed = report.episodes_deduplicated,
            "dropped duplicate episodes"
        );
    }

    let mut cache: HashMap<RepoSlug, Result<Repository, ForgeError>> = HashMap::new();

    for episode in &mut podcast.episodes {
        report.references_deduplicated += episode.dedup_references();

        for reference in &mut episode.references {
            if reference.repository.is_some() {
                report.already_resolved += 1;
                continue;
            }
            let Some(slug) = reference.github_slug() else {
                continue;
            };

            let result = match cache.get(&slug) {
                Some(cached) => {
                    report.cache_hits += 1;
                    cached.clone()
                }
                None => {
                    report.fetched += 1;
                    let fetched = fetch_repository(forge, &slug, requested_on, &mut report).await;
                    cache.insert(slug.clone(), fetched.clone());
                    fetched
                }
            };

            match result {
                Ok(repository) => {
                    reference.repository = Some(repository);
                    report.resolved += 1;
                }
                Err(error) => {
                    warn!(episode = episode.number, %slug, %error, "could not resolve reference");
                    report.failures.push(ResolveFailure {
                        episode: episode.number,
                        slug,
                        error,
                    });
                }
            }
        }
    }

    info!(
        podcast = %podcast.name,
        forge = forge.name(),
        resolved = report.resolved,
        fetched = report.fetched,
        failed = report.failures.len(),
        "resolved references"
    );

    (podcast, report)
}

async fn fetch_repository(
    forge: &dyn Forge,
    slug: &RepoSlug,
    requested_on: NaiveDate,
    report: &mut ResolveReport,
) -> Result<Repository, ForgeError> {
    let info = forge.fetch_repository(slug).await?;
    let stargazers = forge.fetch_stargazers(slug).await?;
    let mut repository = info.into_repository(requested_on, stargazers);

    let dropped = repository.dedup_stargazers();
    if dropped > 0 {
        warn!(%slug, dropped, "dropped duplicate star events");
        report.duplicate_stars_dropped += dropped;
    }

    let fetched = repository.stargazers.len();
    if fetched as u64 != repository.stargazer_count {
        warn!(
            %slug,
            reported = repository.stargazer_count,
            fetched,
            "star count differs from fetched events"
        );
        report.count_mismatches.push(CountMismatch {
            slug: slug.clone(),
            reported: repository.stargazer_count,
            fetched,
        });
    }

    debug!(%slug, stars = fetched, "fetched repository");
    Ok(repository)
}
