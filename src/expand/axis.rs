//! expand::axis
//!
//! Date-axis construction for one repository.
//!
//! The axis is a contiguous run of calendar days ending at the snapshot
//! date. Its length is the larger of
//!
//! - the repository's age at snapshot time (`requested - created`), and
//! - the backfill floor `backfill_days + (requested - podcast_start)`,
//!
//! so every repository carries at least `backfill_days` of history before
//! the podcast's first episode, even when the repository is younger.

use chrono::{Days, NaiveDate};

use super::ExpandError;
use crate::core::types::days_between;

/// Default backfill before the podcast start.
pub const DEFAULT_BACKFILL_DAYS: i64 = 365;

/// Largest accepted backfill, about a century.
pub const MAX_BACKFILL_DAYS: i64 = 36_500;

/// An inclusive, gap-free range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateAxis {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateAxis {
    /// First (oldest) day on the axis.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day on the axis (the snapshot date).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days on the axis.
    pub fn len(&self) -> usize {
        days_between(self.end, self.start) as usize + 1
    }

    /// An axis always holds at least one day.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `date` falls on the axis.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Days in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.len())
    }
}

/// Build the date axis for a repository.
///
/// # Errors
///
/// Returns `ExpandError::DegenerateAxis` when the snapshot predates the
/// repository's creation (inconsistent fetched data) or when the computed
/// length is not positive, and `ExpandError::DateOutOfRange` when the axis
/// start cannot be represented.
pub fn build_axis(
    date_created: NaiveDate,
    date_requested: NaiveDate,
    podcast_start: NaiveDate,
    backfill_days: i64,
) -> Result<DateAxis, ExpandError> {
    let naive_span = days_between(date_requested, date_created);
    if naive_span < 0 {
        return Err(ExpandError::DegenerateAxis {
            date_created,
            date_requested,
            length: naive_span,
        });
    }

    let floor = backfill_days
        .checked_add(days_between(date_requested, podcast_start))
        .ok_or(ExpandError::DateOutOfRange {
            date: date_requested,
            days: backfill_days,
        })?;
    let length = naive_span.max(floor);
    if length <= 0 {
        return Err(ExpandError::DegenerateAxis {
            date_created,
            date_requested,
            length,
        });
    }

    let start = date_requested
        .checked_sub_days(Days::new((length - 1) as u64))
        .ok_or(ExpandError::DateOutOfRange {
            date: date_requested,
            days: length - 1,
        })?;

    Ok(DateAxis {
        start,
        end: date_requested,
    })
}
