//! expand
//!
//! The flattening engine: turns a podcast graph into one row per
//! (repository mention, calendar day).
//!
//! # Pipeline
//!
//! ```text
//! Podcast ─► mentions (episode, reference) ─► axis ─► buckets ─► FlatRow
//! ```
//!
//! - [`axis`] builds the contiguous day range for a repository
//! - [`aggregate`] folds star events onto that range
//! - [`overrides`] resolves the `manually_modified` chain
//! - [`materialize`] joins buckets with metadata and streams rows
//!
//! # Failure policy
//!
//! Problems with a single mention never abort the batch. A reference
//! without a repository, or a repository whose axis is degenerate, yields
//! zero rows and a [`Notice`] on the stream. A missing primary language is
//! replaced with a sentinel and also recorded.

pub mod aggregate;
pub mod axis;
pub mod materialize;
pub mod overrides;

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::model::Podcast;
use crate::core::types::RepoSlug;

pub use aggregate::{aggregate, DateBucket};
pub use axis::{build_axis, DateAxis, DEFAULT_BACKFILL_DAYS, MAX_BACKFILL_DAYS};
pub use materialize::{FlatRow, RowStream};
pub use overrides::resolve_override;

/// Default value written when a repository has no primary language.
pub const DEFAULT_UNKNOWN_LANGUAGE: &str = "unknown";

/// Errors from the expansion engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error(
        "degenerate date axis: created {date_created}, requested {date_requested}, length {length} days"
    )]
    DegenerateAxis {
        date_created: NaiveDate,
        date_requested: NaiveDate,
        length: i64,
    },

    #[error("date out of range: {date} minus {days} days")]
    DateOutOfRange { date: NaiveDate, days: i64 },
}

/// Tunables for a single expansion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Minimum history before the podcast's first episode
    pub backfill_days: i64,
    /// Sentinel for a missing primary language
    pub unknown_language: String,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            backfill_days: DEFAULT_BACKFILL_DAYS,
            unknown_language: DEFAULT_UNKNOWN_LANGUAGE.to_string(),
        }
    }
}

/// Something the engine skipped or patched while producing rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A reference carried no repository; no rows were produced for it.
    MissingRepository {
        episode: u32,
        url: String,
        /// Set when the URL points into GitHub, i.e. a fetch was expected
        slug: Option<RepoSlug>,
    },

    /// A repository's axis could not be built; no rows were produced for it.
    DegenerateAxis {
        episode: u32,
        slug: RepoSlug,
        error: ExpandError,
    },

    /// A repository had no primary language; the sentinel was used.
    MissingLanguage { slug: RepoSlug, sentinel: String },
}

impl Notice {
    /// Whether the notice means rows were dropped.
    pub fn is_skip(&self) -> bool {
        !matches!(self, Notice::MissingLanguage { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::MissingRepository {
                episode,
                url,
                slug: Some(slug),
            } => write!(
                f,
                "episode {}: GitHub reference {} ({}) has no repository data",
                episode, slug, url
            ),
            Notice::MissingRepository { episode, url, .. } => {
                write!(f, "episode {}: reference {} is not a repository", episode, url)
            }
            Notice::DegenerateAxis {
                episode,
                slug,
                error,
            } => write!(f, "episode {}: skipped {}: {}", episode, slug, error),
            Notice::MissingLanguage { slug, sentinel } => write!(
                f,
                "{} has no primary language, using '{}'",
                slug, sentinel
            ),
        }
    }
}

/// Expand a podcast into a lazy stream of rows.
///
/// See [`RowStream`] for ordering and buffering guarantees.
pub fn expand<'a>(podcast: &'a Podcast, options: &ExpandOptions) -> RowStream<'a> {
    RowStream::new(podcast, options.clone())
}
