//! dataset::window
//!
//! Keeps the rows around each mention and aligns them on a shared
//! calendar, so mentions from different years line up day by day.
//!
//! A row survives when both hold:
//!
//! - its mention is at least `recent_episode_days` before the cutoff date
//!   (recent episodes have not accumulated a post-mention window yet)
//! - `-(days_premention + 1) < days_since_mention < days_postmention + 1`
//!
//! Survivors get `aligned_offset = days_since_mention + days_premention`
//! (0 on the first day of the window) and
//! `aligned_date = anchor_date - days_premention + aligned_offset`.

use chrono::{Days, Duration, NaiveDate};
use serde::Serialize;

use super::DatasetError;
use crate::expand::FlatRow;

pub const DEFAULT_DAYS_PREMENTION: i64 = 365;
pub const DEFAULT_DAYS_POSTMENTION: i64 = 30;
pub const DEFAULT_RECENT_EPISODE_DAYS: i64 = 31;

/// Upper bound for every window length, about a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Shared calendar day every mention is aligned to.
pub fn default_anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).expect("2019-01-01 is a valid date")
}

/// Window bounds and alignment anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub days_premention: i64,
    pub days_postmention: i64,
    pub recent_episode_days: i64,
    pub anchor_date: NaiveDate,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            days_premention: DEFAULT_DAYS_PREMENTION,
            days_postmention: DEFAULT_DAYS_POSTMENTION,
            recent_episode_days: DEFAULT_RECENT_EPISODE_DAYS,
            anchor_date: default_anchor_date(),
        }
    }
}

impl WindowOptions {
    /// Reject negative bounds and bounds above [`MAX_WINDOW_DAYS`].
    pub fn validate(&self) -> Result<(), DatasetError> {
        for (name, value) in [
            ("days_premention", self.days_premention),
            ("days_postmention", self.days_postmention),
            ("recent_episode_days", self.recent_episode_days),
        ] {
            if value < 0 {
                return Err(DatasetError::InvalidWindow(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
            if value > MAX_WINDOW_DAYS {
                return Err(DatasetError::InvalidWindow(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_WINDOW_DAYS, value
                )));
            }
        }
        Ok(())
    }
}

/// A flat row inside the mention window, with its aligned position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowedRow {
    #[serde(flatten)]
    pub row: FlatRow,
    pub aligned_offset: i64,
    pub aligned_date: NaiveDate,
}

/// Applies a [`WindowOptions`] against a fixed cutoff date.
#[derive(Debug, Clone)]
pub struct Window {
    options: WindowOptions,
    latest_mention: Option<NaiveDate>,
}

impl Window {
    /// # Errors
    ///
    /// Returns `DatasetError::InvalidWindow` for out-of-range bounds.
    pub fn new(options: WindowOptions, cutoff: NaiveDate) -> Result<Self, DatasetError> {
        options.validate()?;
        let latest_mention = cutoff.checked_sub_days(Days::new(options.recent_episode_days as u64));
        Ok(Self {
            options,
            latest_mention,
        })
    }

    /// Whether the row's mention is old enough to keep.
    pub fn is_settled(&self, row: &FlatRow) -> bool {
        self.latest_mention
            .is_some_and(|latest| row.date_mentioned <= latest)
    }

    /// Whether the row's day falls inside the mention window.
    pub fn in_frame(&self, row: &FlatRow) -> bool {
        let dsm = row.days_since_mention;
        -(self.options.days_premention + 1) < dsm && dsm < self.options.days_postmention + 1
    }

    /// Window and align one row, or drop it.
    pub fn apply(&self, row: FlatRow) -> Option<WindowedRow> {
        if !self.is_settled(&row) || !self.in_frame(&row) {
            return None;
        }

        let aligned_offset = row.days_since_mention + self.options.days_premention;
        let aligned_date = self
            .options
            .anchor_date
            .checked_add_signed(Duration::days(aligned_offset - self.options.days_premention))?;

        Some(WindowedRow {
            row,
            aligned_offset,
            aligned_date,
        })
    }
}

/// Window a stream of rows.
pub fn window<'w, I>(rows: I, window: &'w Window) -> impl Iterator<Item = WindowedRow> + 'w
where
    I: IntoIterator<Item = FlatRow>,
    I::IntoIter: 'w,
{
    rows.into_iter().filter_map(move |row| window.apply(row))
}
