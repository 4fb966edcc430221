//! core::model
//!
//! Domain records for the podcast graph.
//!
//! # Structure
//!
//! ```text
//! Podcast
//!   └── Episode (many)
//!         └── Reference (many)
//!               └── Repository (at most one)
//!                     └── StarGazer (many)
//! ```
//!
//! Records are plain values owned by their parent. There are no back
//! references; code that needs ancestor data walks the tree top-down and
//! passes the ancestors along explicitly.
//!
//! # Persistence
//!
//! The graph is exchanged as JSON. Dates are ISO-8601 calendar dates
//! (`2020-01-31`); star timestamps from the GitHub API are truncated to
//! their UTC date before they enter the model.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::RepoSlug;

/// Errors from reading or writing a podcast graph.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read podcast file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse podcast file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write podcast file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize podcast: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// A single star event on a repository.
///
/// Callers hand the engine deduplicated events; two events with the same
/// `(date_starred, user_id)` are counted twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StarGazer {
    /// UTC calendar date the star was given
    pub date_starred: NaiveDate,
    /// GitHub node id of the user
    pub user_id: String,
}

/// A GitHub repository snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// `owner/name`
    pub slug: RepoSlug,
    /// Web URL
    pub url: String,
    /// Creation date on GitHub
    pub date_created: NaiveDate,
    /// Primary language, if GitHub reports one
    #[serde(default)]
    pub primary_language: Option<String>,
    /// Whether the repository is a fork
    #[serde(default)]
    pub is_fork: bool,
    /// Date the star data was fetched (snapshot date)
    pub date_requested: NaiveDate,
    /// Total star count reported by GitHub at snapshot time
    #[serde(default)]
    pub stargazer_count: u64,
    /// Explicit manual-edit marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manually_modified: Option<bool>,
    /// Star events
    #[serde(default)]
    pub stargazers: Vec<StarGazer>,
}

impl Repository {
    /// Repository owner.
    pub fn owner(&self) -> &str {
        self.slug.owner()
    }

    /// Repository name.
    pub fn name(&self) -> &str {
        self.slug.name()
    }

    /// Remove star events that share `(date_starred, user_id)`.
    ///
    /// Keeps the first occurrence and the original order. Returns the number
    /// of events removed.
    pub fn dedup_stargazers(&mut self) -> usize {
        let before = self.stargazers.len();
        let mut seen = HashSet::with_capacity(before);
        self.stargazers
            .retain(|sg| seen.insert((sg.date_starred, sg.user_id.clone())));
        before - self.stargazers.len()
    }
}

/// A link mentioned in an episode's show notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Link text
    #[serde(default)]
    pub text: String,
    /// Link target
    pub url: String,
    /// Date of the mention; defaults to the episode's publication date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_referenced: Option<NaiveDate>,
    /// Explicit manual-edit marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manually_modified: Option<bool>,
    /// The repository this link resolves to, once fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
}

impl Reference {
    /// The GitHub repository this link points into, if any.
    pub fn github_slug(&self) -> Option<RepoSlug> {
        RepoSlug::from_url(&self.url)
    }

    /// Mention date, falling back to the owning episode's publication date.
    pub fn mention_date(&self, episode: &Episode) -> NaiveDate {
        self.date_referenced.unwrap_or(episode.date_published)
    }
}

/// A podcast episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Show number
    pub number: u32,
    /// Episode title
    pub title: String,
    /// Episode page URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Guests and hosts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guests: Vec<String>,
    /// Publication date
    pub date_published: NaiveDate,
    /// Explicit manual-edit marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manually_modified: Option<bool>,
    /// Links from the show notes
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl Episode {
    /// Remove references that repeat an earlier reference's URL.
    ///
    /// Returns the number of references removed.
    pub fn dedup_references(&mut self) -> usize {
        let before = self.references.len();
        let mut seen = HashSet::with_capacity(before);
        self.references.retain(|r| seen.insert(r.url.clone()));
        before - self.references.len()
    }
}

/// A podcast and its episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    /// Podcast name
    pub name: String,
    /// Author(s)
    #[serde(default)]
    pub author: String,
    /// Episode index URL
    #[serde(default)]
    pub url: String,
    /// Date the first episode aired
    pub start_date: NaiveDate,
    /// Explicit manual-edit marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manually_modified: Option<bool>,
    /// Episodes
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Podcast {
    /// Read a podcast graph from a JSON file.
    pub fn read_from(path: &Path) -> Result<Self, ModelError> {
        let contents = fs::read_to_string(path).map_err(|e| ModelError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&contents).map_err(|e| ModelError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the podcast graph as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), ModelError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|e| ModelError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Remove episodes that repeat an earlier `(number, date_published)`.
    ///
    /// Returns the number of episodes removed.
    pub fn dedup_episodes(&mut self) -> usize {
        let before = self.episodes.len();
        let mut seen = HashSet::with_capacity(before);
        self.episodes
            .retain(|e| seen.insert((e.number, e.date_published)));
        before - self.episodes.len()
    }

    /// Number of references across all episodes.
    pub fn reference_count(&self) -> usize {
        self.episodes.iter().map(|e| e.references.len()).sum()
    }

    /// Number of references that carry a resolved repository.
    pub fn repository_count(&self) -> usize {
        self.repositories().count()
    }

    /// Number of star events across all resolved repositories.
    pub fn star_event_count(&self) -> usize {
        self.repositories().map(|r| r.stargazers.len()).sum()
    }

    fn repositories(&self) -> impl Iterator<Item = &Repository> {
        self.episodes
            .iter()
            .flat_map(|e| e.references.iter())
            .filter_map(|r| r.repository.as_ref())
    }
}
