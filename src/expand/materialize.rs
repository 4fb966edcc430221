//! expand::materialize
//!
//! Joins per-day buckets with podcast, episode, reference and repository
//! metadata and streams the result as [`FlatRow`]s.
//!
//! # Ordering
//!
//! Rows come out grouped by mention, in episode order then reference order
//! within the episode, and ascending by date within a mention.
//!
//! # Memory
//!
//! [`RowStream`] holds the buckets of at most one repository at a time. The
//! next repository's axis is built only once the current one is drained.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::aggregate::{aggregate, DateBucket};
use super::axis::build_axis;
use super::overrides;
use super::{ExpandOptions, Notice};
use crate::core::model::{Episode, Podcast, Reference, Repository};
use crate::core::types::{days_between, RepoSlug};

/// One (repository mention, day) row.
///
/// Field order is the column order of exported tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub date: NaiveDate,
    pub accumulated_count: u64,
    pub daily_delta: u64,
    pub relative_growth: f64,
    pub repository_exists: bool,
    pub date_mentioned: NaiveDate,
    pub date_repository_created: NaiveDate,
    pub date_requested: NaiveDate,
    pub podcast_name: String,
    pub podcast_start_date: NaiveDate,
    pub episode_number: u32,
    pub episode_title: String,
    pub repository_owner: String,
    pub repository_name: String,
    pub repository_url: String,
    pub repository_is_fork: bool,
    pub repository_primary_language: String,
    pub manually_modified: bool,
    pub days_since_creation: i64,
    pub days_since_mention: i64,
    pub days_since_podcast_start: i64,
    pub days_since_data_requested: i64,
}

/// Metadata shared by every row of one mention.
#[derive(Debug, Clone)]
struct MentionContext {
    date_mentioned: NaiveDate,
    date_repository_created: NaiveDate,
    date_requested: NaiveDate,
    podcast_name: String,
    podcast_start_date: NaiveDate,
    episode_number: u32,
    episode_title: String,
    repository_owner: String,
    repository_name: String,
    repository_url: String,
    repository_is_fork: bool,
    repository_primary_language: String,
    manually_modified: bool,
}

impl MentionContext {
    fn row(&self, bucket: DateBucket) -> FlatRow {
        let date = bucket.date;
        FlatRow {
            date,
            accumulated_count: bucket.accumulated_count,
            daily_delta: bucket.daily_delta,
            relative_growth: bucket.relative_growth,
            repository_exists: bucket.existed,
            date_mentioned: self.date_mentioned,
            date_repository_created: self.date_repository_created,
            date_requested: self.date_requested,
            podcast_name: self.podcast_name.clone(),
            podcast_start_date: self.podcast_start_date,
            episode_number: self.episode_number,
            episode_title: self.episode_title.clone(),
            repository_owner: self.repository_owner.clone(),
            repository_name: self.repository_name.clone(),
            repository_url: self.repository_url.clone(),
            repository_is_fork: self.repository_is_fork,
            repository_primary_language: self.repository_primary_language.clone(),
            manually_modified: self.manually_modified,
            days_since_creation: days_between(date, self.date_repository_created),
            days_since_mention: days_between(date, self.date_mentioned),
            days_since_podcast_start: days_between(date, self.podcast_start_date),
            days_since_data_requested: days_between(date, self.date_requested),
        }
    }
}

/// The mention currently being drained.
struct Pending {
    context: MentionContext,
    buckets: std::vec::IntoIter<DateBucket>,
}

/// Lazy iterator over the rows of a podcast.
///
/// Skip notices accumulate on the stream as it advances; read them with
/// [`RowStream::notices`] once iteration is done. Skips are reported per
/// mention, a missing language once per repository.
pub struct RowStream<'a> {
    podcast: &'a Podcast,
    options: ExpandOptions,
    mentions: std::vec::IntoIter<(&'a Episode, &'a Reference)>,
    current: Option<Pending>,
    notices: Vec<Notice>,
    unknown_languages: HashSet<RepoSlug>,
    rows_emitted: usize,
    repositories_expanded: usize,
    finished: bool,
}

impl<'a> RowStream<'a> {
    pub(crate) fn new(podcast: &'a Podcast, options: ExpandOptions) -> Self {
        let mentions: Vec<(&Episode, &Reference)> = podcast
            .episodes
            .iter()
            .flat_map(|episode| episode.references.iter().map(move |r| (episode, r)))
            .collect();

        debug!(
            podcast = %podcast.name,
            mentions = mentions.len(),
            backfill_days = options.backfill_days,
            "expanding podcast"
        );

        Self {
            podcast,
            options,
            mentions: mentions.into_iter(),
            current: None,
            notices: Vec::new(),
            unknown_languages: HashSet::new(),
            rows_emitted: 0,
            repositories_expanded: 0,
            finished: false,
        }
    }

    /// Notices recorded so far.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Consume the stream, returning its notices.
    pub fn into_notices(self) -> Vec<Notice> {
        self.notices
    }

    /// Rows produced so far.
    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    /// Repositories whose rows have started streaming.
    pub fn repositories_expanded(&self) -> usize {
        self.repositories_expanded
    }

    fn open(&mut self, episode: &Episode, reference: &Reference) -> Option<Pending> {
        let Some(repository) = reference.repository.as_ref() else {
            let slug = reference.github_slug();
            match &slug {
                Some(slug) => warn!(
                    episode = episode.number,
                    %slug,
                    "GitHub reference has no repository data, skipping"
                ),
                None => debug!(
                    episode = episode.number,
                    url = %reference.url,
                    "reference is not a repository, skipping"
                ),
            }
            self.notices.push(Notice::MissingRepository {
                episode: episode.number,
                url: reference.url.clone(),
                slug,
            });
            return None;
        };

        let axis = match build_axis(
            repository.date_created,
            repository.date_requested,
            self.podcast.start_date,
            self.options.backfill_days,
        ) {
            Ok(axis) => axis,
            Err(error) => {
                warn!(
                    episode = episode.number,
                    slug = %repository.slug,
                    %error,
                    "skipping repository"
                );
                self.notices.push(Notice::DegenerateAxis {
                    episode: episode.number,
                    slug: repository.slug.clone(),
                    error,
                });
                return None;
            }
        };

        let language = self.language_for(repository);
        let context = MentionContext {
            date_mentioned: reference.mention_date(episode),
            date_repository_created: repository.date_created,
            date_requested: repository.date_requested,
            podcast_name: self.podcast.name.clone(),
            podcast_start_date: self.podcast.start_date,
            episode_number: episode.number,
            episode_title: episode.title.clone(),
            repository_owner: repository.owner().to_string(),
            repository_name: repository.name().to_string(),
            repository_url: repository.url.clone(),
            repository_is_fork: repository.is_fork,
            repository_primary_language: language,
            manually_modified: overrides::manually_modified(
                self.podcast,
                episode,
                reference,
                repository,
            ),
        };

        let buckets = aggregate(&axis, repository.date_created, &repository.stargazers);
        debug!(
            slug = %repository.slug,
            days = buckets.len(),
            events = repository.stargazers.len(),
            "aggregated repository"
        );
        self.repositories_expanded += 1;

        Some(Pending {
            context,
            buckets: buckets.into_iter(),
        })
    }

    fn language_for(&mut self, repository: &Repository) -> String {
        match repository.primary_language.as_deref() {
            Some(language) if !language.trim().is_empty() => language.to_string(),
            _ => {
                let sentinel = self.options.unknown_language.clone();
                if self.unknown_languages.insert(repository.slug.clone()) {
                    warn!(
                        slug = %repository.slug,
                        %sentinel,
                        "repository has no primary language"
                    );
                    self.notices.push(Notice::MissingLanguage {
                        slug: repository.slug.clone(),
                        sentinel: sentinel.clone(),
                    });
                }
                sentinel
            }
        }
    }
}

impl Iterator for RowStream<'_> {
    type Item = FlatRow;

    fn next(&mut self) -> Option<FlatRow> {
        loop {
            if let Some(pending) = self.current.as_mut() {
                if let Some(bucket) = pending.buckets.next() {
                    self.rows_emitted += 1;
                    return Some(pending.context.row(bucket));
                }
                self.current = None;
            }

            match self.mentions.next() {
                Some((episode, reference)) => self.current = self.open(episode, reference),
                None => {
                    if !self.finished {
                        self.finished = true;
                        info!(
                            podcast = %self.podcast.name,
                            rows = self.rows_emitted,
                            repositories = self.repositories_expanded,
                            skipped = self.notices.iter().filter(|n| n.is_skip()).count(),
                            "expansion complete"
                        );
                    }
                    return None;
                }
            }
        }
    }
}
