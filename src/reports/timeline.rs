//! Daily allocation timeline
//!
//! Re-aggregates a growing prefix of the ledger once per calendar day. The
//! postings must be sorted ascending by date: a cursor walks the slice once
//! and never moves backward, so the merge work across the whole timeline is
//! linear in the number of postings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use super::aggregate::{compute_aggregate, Snapshot};
use crate::db::Posting;

/// Days from `start` while the day's midnight is strictly before `now`.
pub fn timeline_dates(start: NaiveDate, now: NaiveDateTime) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut day = start;
    while day.and_time(NaiveTime::MIN) < now {
        dates.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    dates
}

/// Build one snapshot per day from the earliest posting up to `now`.
///
/// Each snapshot covers every posting dated on or before its day. Unsorted
/// input trips a debug assertion; release builds give unspecified grouping.
pub fn compute_aggregate_timeline(postings: &[Posting], now: NaiveDateTime) -> Vec<Snapshot> {
    let Some(first) = postings.first() else {
        return Vec::new();
    };
    debug_assert!(
        postings.windows(2).all(|w| w[0].date <= w[1].date),
        "postings must be sorted by date"
    );

    let dates = timeline_dates(first.date, now);
    let mut timeline = Vec::with_capacity(dates.len());
    let mut seen: Vec<Posting> = Vec::new();
    let mut cursor = 0;

    for day in dates {
        while cursor < postings.len() && postings[cursor].date <= day {
            seen.push(postings[cursor].clone());
            cursor += 1;
        }
        timeline.push(compute_aggregate(&seen, day));
    }

    debug!(
        "Built {} day timeline over {} of {} postings",
        timeline.len(),
        cursor,
        postings.len()
    );
    timeline
}
