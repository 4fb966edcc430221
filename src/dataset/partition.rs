//! dataset::partition
//!
//! Time-ordered holdout split by episode.
//!
//! Audiences grow over time, so later episodes are held out. For each
//! podcast the distinct episode numbers are sorted and
//! `cutoff = floor(count * holdout_fraction)`. The last `cutoff` episodes
//! become test data, the `cutoff` episodes before them validation data and
//! everything earlier training data. With `cutoff == 0` (few episodes or a
//! zero fraction) every row is training data.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, info};

use super::window::WindowedRow;
use super::DatasetError;

pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.20;

/// Which split a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Training,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Training, Split::Validation, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Training => "training",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows grouped by split, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Splits {
    pub training: Vec<WindowedRow>,
    pub validation: Vec<WindowedRow>,
    pub test: Vec<WindowedRow>,
}

impl Splits {
    pub fn get(&self, split: Split) -> &[WindowedRow] {
        match split {
            Split::Training => &self.training,
            Split::Validation => &self.validation,
            Split::Test => &self.test,
        }
    }

    fn push(&mut self, split: Split, row: WindowedRow) {
        match split {
            Split::Training => self.training.push(row),
            Split::Validation => self.validation.push(row),
            Split::Test => self.test.push(row),
        }
    }

    pub fn len(&self) -> usize {
        self.training.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Episode thresholds for one podcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Boundaries {
    first_validation: u32,
    first_test: u32,
}

impl Boundaries {
    fn classify(boundaries: Option<Self>, episode: u32) -> Split {
        match boundaries {
            Some(b) if episode >= b.first_test => Split::Test,
            Some(b) if episode >= b.first_validation => Split::Validation,
            _ => Split::Training,
        }
    }
}

/// Check a holdout fraction: finite and in `[0, 0.5)`.
pub fn validate_fraction(fraction: f64) -> Result<(), DatasetError> {
    if fraction.is_finite() && (0.0..0.5).contains(&fraction) {
        Ok(())
    } else {
        Err(DatasetError::InvalidFraction(fraction))
    }
}

/// Number of episodes held out per split.
pub fn holdout_count(episodes: usize, fraction: f64) -> usize {
    (episodes as f64 * fraction).floor() as usize
}

fn boundaries(episodes: &BTreeSet<u32>, fraction: f64) -> Option<Boundaries> {
    let sorted: Vec<u32> = episodes.iter().copied().collect();
    let cutoff = holdout_count(sorted.len(), fraction);
    if cutoff == 0 {
        return None;
    }
    Some(Boundaries {
        first_validation: sorted[sorted.len() - 2 * cutoff],
        first_test: sorted[sorted.len() - cutoff],
    })
}

/// Split rows into training, validation and test sets, per podcast.
///
/// # Errors
///
/// Returns `DatasetError::InvalidFraction` unless `0 <= fraction < 0.5`.
pub fn partition(rows: Vec<WindowedRow>, fraction: f64) -> Result<Splits, DatasetError> {
    validate_fraction(fraction)?;

    let mut episodes: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for r in &rows {
        episodes
            .entry(r.row.podcast_name.as_str())
            .or_default()
            .insert(r.row.episode_number);
    }

    let thresholds: BTreeMap<String, Option<Boundaries>> = episodes
        .iter()
        .map(|(podcast, eps)| {
            let b = boundaries(eps, fraction);
            match b {
                Some(b) => info!(
                    podcast,
                    episodes = eps.len(),
                    first_validation = b.first_validation,
                    first_test = b.first_test,
                    "partitioned episodes"
                ),
                None => debug!(
                    podcast,
                    episodes = eps.len(),
                    "too few episodes to hold out, all training"
                ),
            }
            (podcast.to_string(), b)
        })
        .collect();

    let mut splits = Splits::default();
    for r in rows {
        let b = thresholds.get(&r.row.podcast_name).copied().flatten();
        let split = Boundaries::classify(b, r.row.episode_number);
        splits.push(split, r);
    }

    Ok(splits)
}
