//! expand::aggregate
//!
//! Per-day star aggregation over a date axis.
//!
//! # Algorithm
//!
//! Star dates are sorted once and merged against the ascending axis with a
//! single cursor, so the cost is `O(days + events log events)` regardless of
//! input order. For each day `d`:
//!
//! - `accumulated_count` = events with `date_starred <= d` (events before the
//!   axis start count toward every bucket)
//! - `daily_delta` = events with `date_starred == d`
//! - `existed` = `d >= date_created`
//! - `relative_growth` = `daily_delta / previous accumulated_count`, or `0`
//!   when there is no previous bucket or it held zero stars
//!
//! Events after the axis end are never counted.

use chrono::NaiveDate;
use serde::Serialize;

use super::axis::DateAxis;
use crate::core::model::StarGazer;

/// One day's star aggregate for a repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBucket {
    /// Calendar day
    pub date: NaiveDate,
    /// Stars given on or before this day
    pub accumulated_count: u64,
    /// Stars given on this day
    pub daily_delta: u64,
    /// Whether the repository had been created by this day
    pub existed: bool,
    /// `daily_delta` relative to the previous day's `accumulated_count`
    pub relative_growth: f64,
}

/// Aggregate star events onto every day of `axis`.
///
/// Returns exactly `axis.len()` buckets in ascending date order.
pub fn aggregate(axis: &DateAxis, date_created: NaiveDate, events: &[StarGazer]) -> Vec<DateBucket> {
    aggregate_dates(axis, date_created, events.iter().map(|e| e.date_starred))
}

/// Same as [`aggregate`], over bare star dates.
pub fn aggregate_dates(
    axis: &DateAxis,
    date_created: NaiveDate,
    dates: impl IntoIterator<Item = NaiveDate>,
) -> Vec<DateBucket> {
    let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
    dates.sort_unstable();

    let mut buckets = Vec::with_capacity(axis.len());
    let mut cursor = 0;
    let mut previous: Option<u64> = None;

    for day in axis.days() {
        let mut daily_delta = 0;
        while cursor < dates.len() && dates[cursor] <= day {
            if dates[cursor] == day {
                daily_delta += 1;
            }
            cursor += 1;
        }
        let accumulated_count = cursor as u64;

        buckets.push(DateBucket {
            date: day,
            accumulated_count,
            daily_delta,
            existed: day >= date_created,
            relative_growth: relative_growth(daily_delta, previous),
        });
        previous = Some(accumulated_count);
    }

    buckets
}

/// Day-over-day growth; zero when the previous total is missing or zero.
fn relative_growth(daily_delta: u64, previous_accumulated: Option<u64>) -> f64 {
    match previous_accumulated {
        Some(prev) if prev > 0 => daily_delta as f64 / prev as f64,
        _ => 0.0,
    }
}
