//! Parsed dates and materialized yearly occurrences.
//!
//! # Responsibility
//! - Carry the parser output (`ParsedDate`) with its year-certainty flag.
//! - Describe one all-day calendar occurrence built for a target year.
//!
//! # Invariants
//! - `ParsedDate::has_explicit_year == false` iff `year == SENTINEL_YEAR`.
//! - Occurrence time ranges are UTC midnight to UTC midnight of the next day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder year for dates recorded without a year.
///
/// Old enough to never collide with a real birth year.
pub const SENTINEL_YEAR: i32 = 1700;

/// Milliseconds in one all-day event span.
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Structured output of the date parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub has_explicit_year: bool,
}

impl ParsedDate {
    /// Date with a year taken from the source string.
    ///
    /// A source year equal to `SENTINEL_YEAR` is read as unknown.
    pub fn with_year(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            has_explicit_year: year != SENTINEL_YEAR,
        }
    }

    /// Date whose year was omitted by the source; uses `SENTINEL_YEAR`.
    pub fn without_year(month: u32, day: u32) -> Self {
        Self {
            year: SENTINEL_YEAR,
            month,
            day,
            has_explicit_year: false,
        }
    }

    /// Returns `(year, month, day)`, the year being the sentinel when unknown.
    pub fn calendar_date(&self) -> (i32, u32, u32) {
        (self.year, self.month, self.day)
    }
}

/// One yearly instance produced by the expander, before titling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceSkeleton {
    pub target_year: i32,
    pub date: NaiveDate,
    pub age: i32,
    pub include_age: bool,
}

impl OccurrenceSkeleton {
    /// Start of the all-day span in epoch milliseconds (UTC midnight).
    pub fn start_millis(&self) -> i64 {
        date_to_utc_millis(self.date)
    }
}

/// One materialized, titled occurrence ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarOccurrence {
    pub event_date: NaiveDate,
    /// Epoch millis of UTC midnight on `event_date`.
    pub start_ms: i64,
    /// Exactly one day after `start_ms`.
    pub end_ms: i64,
    pub title: String,
    pub age: i32,
    pub include_age: bool,
    /// Minute offsets relative to `start_ms`; negative is before midnight.
    pub reminders: Vec<i32>,
    /// Position of the producing record in the unique record list.
    pub record_slot: usize,
    /// Identity of this occurrence across syncs (`dedup_key` + year).
    pub sync_key: String,
    pub contact_link: Option<String>,
}

/// Converts a calendar date to epoch millis at UTC midnight.
pub fn date_to_utc_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}
