//! Property-based tests for the expansion engine.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use starcast::core::model::{Episode, Podcast, Reference, Repository, StarGazer};
use starcast::core::types::{days_between, RepoSlug};
use starcast::expand::{aggregate, build_axis, expand, resolve_override, ExpandOptions};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

fn day(offset: u64) -> NaiveDate {
    base_date().checked_add_days(Days::new(offset)).unwrap()
}

/// (created, requested, podcast_start, backfill) with requested >= created.
fn axis_inputs() -> impl Strategy<Value = (NaiveDate, NaiveDate, NaiveDate, i64)> {
    (0u64..2000, 0u64..1500, 0u64..3000, 0i64..400).prop_map(|(created, age, start, backfill)| {
        (day(created), day(created + age), day(start), backfill)
    })
}

/// Star offsets relative to the repository creation date, allowing some
/// before creation and some after the snapshot.
fn star_offsets() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-30i64..1600, 0..200)
}

fn stars_from(created: NaiveDate, offsets: &[i64]) -> Vec<StarGazer> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, &offset)| StarGazer {
            date_starred: created + chrono::Duration::days(offset),
            user_id: format!("u{}", i),
        })
        .collect()
}

/// Strategy for slug halves that survive URL extraction unchanged.
fn slug_part() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-][A-Za-z0-9._-]{0,20}".prop_filter("no .git suffix", |s| !s.ends_with(".git"))
}

proptest! {
    #[test]
    fn axis_length_is_max_of_age_and_floor((created, requested, start, backfill) in axis_inputs()) {
        let expected = days_between(requested, created)
            .max(backfill + days_between(requested, start));

        match build_axis(created, requested, start, backfill) {
            Ok(axis) => {
                prop_assert_eq!(axis.len() as i64, expected);
                prop_assert_eq!(axis.end(), requested);
                prop_assert_eq!(axis.days().count(), axis.len());
                prop_assert_eq!(axis.days().last(), Some(requested));
            }
            Err(_) => prop_assert!(expected <= 0),
        }
    }

    #[test]
    fn aggregate_series_invariants(
        (created, requested, start, backfill) in axis_inputs(),
        offsets in star_offsets(),
    ) {
        prop_assume!(build_axis(created, requested, start, backfill).is_ok());
        let axis = build_axis(created, requested, start, backfill).unwrap();
        let stars = stars_from(created, &offsets);
        let buckets = aggregate(&axis, created, &stars);

        prop_assert_eq!(buckets.len(), axis.len());

        // Contiguous ascending days
        for (bucket, expected_day) in buckets.iter().zip(axis.days()) {
            prop_assert_eq!(bucket.date, expected_day);
            prop_assert_eq!(bucket.existed, bucket.date >= created);
        }

        // Monotone totals whose steps are the daily deltas
        for pair in buckets.windows(2) {
            prop_assert!(pair[1].accumulated_count >= pair[0].accumulated_count);
            prop_assert_eq!(
                pair[1].accumulated_count - pair[0].accumulated_count,
                pair[1].daily_delta
            );
            let expected_growth = if pair[0].accumulated_count == 0 {
                0.0
            } else {
                pair[1].daily_delta as f64 / pair[0].accumulated_count as f64
            };
            prop_assert_eq!(pair[1].relative_growth, expected_growth);
        }

        prop_assert_eq!(buckets[0].relative_growth, 0.0);

        // Every event dated on the axis shows up in exactly one delta
        let delta_total: u64 = buckets.iter().map(|b| b.daily_delta).sum();
        let on_axis = stars.iter().filter(|s| axis.contains(s.date_starred)).count() as u64;
        prop_assert_eq!(delta_total, on_axis);

        let first = &buckets[0];
        let before_or_on_start = stars.iter().filter(|s| s.date_starred <= first.date).count() as u64;
        prop_assert_eq!(first.accumulated_count, before_or_on_start);

        let last = buckets.last().unwrap();
        let within_snapshot = stars.iter().filter(|s| s.date_starred <= requested).count() as u64;
        prop_assert_eq!(last.accumulated_count, within_snapshot);
    }

    #[test]
    fn aggregate_ignores_event_order(
        (created, requested, start, backfill) in axis_inputs(),
        offsets in star_offsets(),
    ) {
        prop_assume!(build_axis(created, requested, start, backfill).is_ok());
        let axis = build_axis(created, requested, start, backfill).unwrap();
        let stars = stars_from(created, &offsets);
        let mut reversed = stars.clone();
        reversed.reverse();

        prop_assert_eq!(aggregate(&axis, created, &stars), aggregate(&axis, created, &reversed));
    }

    #[test]
    fn override_is_most_specific_explicit_value(chain in prop::collection::vec(prop::option::of(any::<bool>()), 0..6)) {
        let expected = chain.iter().rev().flatten().next().copied().unwrap_or(false);
        prop_assert_eq!(resolve_override(&chain), expected);
    }

    #[test]
    fn slug_survives_url_extraction(owner in slug_part(), name in slug_part(), suffix in "(|/|/issues/1|/tree/main|\\.git|#readme)") {
        prop_assume!(name != "." && name != "..");
        let slug = RepoSlug::new(owner.clone(), name.clone()).unwrap();
        let url = format!("https://github.com/{}/{}{}", owner, name, suffix);

        prop_assert_eq!(RepoSlug::from_url(&url), Some(slug.clone()));
        prop_assert_eq!(RepoSlug::parse(&slug.to_string()).unwrap(), slug);
    }

    #[test]
    fn expansion_row_count_matches_axes(
        repos in prop::collection::vec((0u64..1000, 0u64..400, star_offsets()), 1..5),
        backfill in 0i64..60,
    ) {
        let start = day(500);
        let mut expected_rows = 0usize;
        let mut references = Vec::new();

        for (i, (created_offset, age, offsets)) in repos.iter().enumerate() {
            let created = day(*created_offset);
            let requested = day(created_offset + age);
            if let Ok(axis) = build_axis(created, requested, start, backfill) {
                expected_rows += axis.len();
            }
            let slug = RepoSlug::new("owner", format!("repo{}", i)).unwrap();
            references.push(Reference {
                text: String::new(),
                url: slug.url(),
                date_referenced: None,
                manually_modified: None,
                repository: Some(Repository {
                    url: slug.url(),
                    slug,
                    date_created: created,
                    primary_language: Some("Rust".into()),
                    is_fork: false,
                    date_requested: requested,
                    stargazer_count: offsets.len() as u64,
                    manually_modified: None,
                    stargazers: stars_from(created, offsets),
                }),
            });
        }

        let podcast = Podcast {
            name: "Prop Cast".into(),
            author: String::new(),
            url: String::new(),
            start_date: start,
            manually_modified: None,
            episodes: vec![Episode {
                number: 1,
                title: "Pilot".into(),
                url: None,
                guests: vec![],
                date_published: day(600),
                manually_modified: None,
                references,
            }],
        };

        let options = ExpandOptions { backfill_days: backfill, ..ExpandOptions::default() };
        let rows: Vec<_> = expand(&podcast, &options).collect();
        prop_assert_eq!(rows.len(), expected_rows);

        // Each repository's days appear once
        let keys: BTreeSet<_> = rows.iter().map(|r| (r.repository_name.clone(), r.date)).collect();
        prop_assert_eq!(keys.len(), rows.len());
    }
}
