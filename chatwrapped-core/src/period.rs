//! Temporal bucketing
//!
//! Maps timestamps to canonical bucket keys at five granularities.
//! Every statistic stores its timeline at hour resolution internally
//! ([`hour_slot`]); coarser views are deterministic reductions of that key
//! via [`bucket_key`]. This module performs no timezone conversion: callers
//! present already-localized timestamps, and converting here would risk
//! double conversion.

use crate::error::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

/// Aggregation granularity for timeline queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Hour,
    Day,
    /// Calendar week keyed by its Monday (ISO convention).
    Week,
    Month,
    Year,
}

impl Period {
    /// Whether this period groups multiple days into one bucket. Such
    /// buckets can straddle a date-range boundary, so range-filtered
    /// aggregation must go through daily resolution first.
    pub fn is_coarser_than_day(&self) -> bool {
        matches!(self, Period::Week | Period::Month | Period::Year)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Hour => "hour",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hour" => Ok(Period::Hour),
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(Error::InvalidPeriod(other.to_string())),
        }
    }
}

/// Canonical representative of one bucket.
///
/// The hour period keeps the full (hour-floored) datetime; day, week, month
/// and year reduce to a calendar date. Within a single query every key is
/// the same variant, so the derived ordering is only ever exercised
/// per-variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Hour(NaiveDateTime),
    Date(NaiveDate),
}

impl BucketKey {
    /// The calendar date this bucket falls on (or starts on).
    pub fn date(&self) -> NaiveDate {
        match self {
            BucketKey::Hour(dt) => dt.date(),
            BucketKey::Date(d) => *d,
        }
    }
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketKey::Hour(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            BucketKey::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Truncate a timestamp to its hour: the canonical internal timeline key.
pub fn hour_slot(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), 0, 0)
        .expect("hour already in range")
}

/// Hour-of-day projection, 0..=23.
pub fn hour_of_day(ts: NaiveDateTime) -> u32 {
    ts.hour()
}

/// Map an hour-resolution slot to the bucket key for `period`.
///
/// Total over all five periods; the invalid-granularity contract lives at
/// the string boundary ([`Period::from_str`]).
pub fn bucket_key(slot: NaiveDateTime, period: Period) -> BucketKey {
    match period {
        Period::Hour => BucketKey::Hour(hour_slot(slot)),
        Period::Day => BucketKey::Date(slot.date()),
        Period::Week => {
            let date = slot.date();
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            BucketKey::Date(monday)
        }
        Period::Month => {
            BucketKey::Date(slot.date().with_day(1).expect("day 1 is always valid"))
        }
        Period::Year => BucketKey::Date(
            NaiveDate::from_ymd_opt(slot.year(), 1, 1).expect("jan 1 is always valid"),
        ),
    }
}

/// Bucket a calendar date (used when re-bucketing daily data into coarser
/// periods during cross-conversation aggregation).
pub fn bucket_key_for_date(date: NaiveDate, period: Period) -> BucketKey {
    bucket_key(
        date.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
        period,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!(Period::from_str("week").unwrap(), Period::Week);
        assert!(matches!(
            Period::from_str("fortnight"),
            Err(Error::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_hour_slot_truncates() {
        assert_eq!(hour_slot(dt(2025, 3, 14, 9, 26)), dt(2025, 3, 14, 9, 0));
    }

    #[test]
    fn test_week_key_is_monday() {
        // 2025-01-08 is a Wednesday; its week starts Monday 2025-01-06.
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(
            bucket_key(dt(2025, 1, 8, 15, 0), Period::Week),
            BucketKey::Date(monday)
        );
        // A Monday keys to itself.
        assert_eq!(
            bucket_key(dt(2025, 1, 6, 0, 0), Period::Week),
            BucketKey::Date(monday)
        );
    }

    #[test]
    fn test_same_day_same_week() {
        let a = bucket_key(dt(2025, 1, 8, 1, 0), Period::Week);
        let b = bucket_key(dt(2025, 1, 8, 23, 0), Period::Week);
        assert_eq!(a, b);
        // Sunday vs following Monday land in different weeks.
        let sun = bucket_key(dt(2025, 1, 5, 23, 0), Period::Week);
        let mon = bucket_key(dt(2025, 1, 6, 0, 0), Period::Week);
        assert_ne!(sun, mon);
    }

    #[test]
    fn test_month_and_year_keys() {
        assert_eq!(
            bucket_key(dt(2025, 7, 19, 8, 0), Period::Month),
            BucketKey::Date(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
        );
        assert_eq!(
            bucket_key(dt(2025, 7, 19, 8, 0), Period::Year),
            BucketKey::Date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_bucket_key_display() {
        assert_eq!(
            bucket_key(dt(2025, 7, 19, 8, 30), Period::Hour).to_string(),
            "2025-07-19T08:00:00"
        );
        assert_eq!(
            bucket_key(dt(2025, 7, 19, 8, 30), Period::Day).to_string(),
            "2025-07-19"
        );
    }
}
