//! Ordered fallback parser for contact date strings.
//!
//! # Responsibility
//! - Recognize the date shapes contact stores emit without a schema.
//! - Flag dates whose year was omitted by the source.
//!
//! # Invariants
//! - The chain is strict: once one format matches, later formats are not
//!   attempted even if the result looks implausible.
//! - Day and month are not range-checked before acceptance; out-of-range
//!   values roll over like a lenient calendar (`02-30` becomes `03-02`).
//! - No-year dates are normalized against a leap year so `--02-29` survives.
//! - `has_explicit_year` is false exactly when the sentinel year is used; a
//!   source year of 1700 counts as unknown.

use crate::config::DateOrder;
use crate::model::occurrence::ParsedDate;
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::str::FromStr;

/// Leap year used to normalize month/day of dates without a year.
const LEAP_REFERENCE_YEAR: i32 = 2000;

static ISO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ].*)?$").expect("valid iso regex")
});
static NO_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--(\d{1,2})-?(\d{1,2})$").expect("valid no-year regex"));
static COMPACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("valid compact regex"));
static SLASH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid slash regex"));
static SLASH_NO_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})$").expect("valid short slash regex"));
static DOT_DAY_FIRST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$").expect("valid dotted regex"));
static DOT_YEAR_FIRST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})\.(\d{1,2})\.(\d{1,2})$").expect("valid dotted regex"));

type FormatParser = fn(&str, DateOrder) -> Option<ParsedDate>;

/// Fallback chain in the order it is attempted.
const FORMAT_CHAIN: &[(&str, FormatParser)] = &[
    ("iso", parse_iso),
    ("no_year", parse_no_year),
    ("compact", parse_compact),
    ("slash_with_year", parse_slash_with_year),
    ("slash_without_year", parse_slash_without_year),
    ("dotted_day_first", parse_dotted_day_first),
    ("dotted_year_first", parse_dotted_year_first),
    ("epoch_millis", parse_epoch_millis),
];

/// Parses one raw date string.
///
/// Returns `None` when no format in the chain accepts the input.
pub fn parse(raw: &str, order: DateOrder) -> Option<ParsedDate> {
    parse_with_format(raw, order).map(|(parsed, _)| parsed)
}

/// Parses one raw date string and reports which format matched.
pub fn parse_with_format(raw: &str, order: DateOrder) -> Option<(ParsedDate, &'static str)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    FORMAT_CHAIN
        .iter()
        .find_map(|(name, parser)| parser(trimmed, order).map(|parsed| (parsed, *name)))
}

/// Names of the formats in attempt order.
pub fn format_names() -> Vec<&'static str> {
    FORMAT_CHAIN.iter().map(|(name, _)| *name).collect()
}

fn parse_iso(raw: &str, _order: DateOrder) -> Option<ParsedDate> {
    let caps = ISO_RE.captures(raw)?;
    explicit(number(&caps, 1)?, number(&caps, 2)?, number(&caps, 3)?)
}

fn parse_no_year(raw: &str, _order: DateOrder) -> Option<ParsedDate> {
    let caps = NO_YEAR_RE.captures(raw)?;
    yearless(number(&caps, 1)?, number(&caps, 2)?)
}

fn parse_compact(raw: &str, _order: DateOrder) -> Option<ParsedDate> {
    let caps = COMPACT_RE.captures(raw)?;
    explicit(number(&caps, 1)?, number(&caps, 2)?, number(&caps, 3)?)
}

fn parse_slash_with_year(raw: &str, order: DateOrder) -> Option<ParsedDate> {
    let caps = SLASH_YEAR_RE.captures(raw)?;
    let (month, day) = ordered(&caps, order)?;
    explicit(number(&caps, 3)?, month, day)
}

fn parse_slash_without_year(raw: &str, order: DateOrder) -> Option<ParsedDate> {
    let caps = SLASH_NO_YEAR_RE.captures(raw)?;
    let (month, day) = ordered(&caps, order)?;
    yearless(month, day)
}

fn parse_dotted_day_first(raw: &str, _order: DateOrder) -> Option<ParsedDate> {
    let caps = DOT_DAY_FIRST_RE.captures(raw)?;
    explicit(number(&caps, 3)?, number(&caps, 2)?, number(&caps, 1)?)
}

fn parse_dotted_year_first(raw: &str, _order: DateOrder) -> Option<ParsedDate> {
    let caps = DOT_YEAR_FIRST_RE.captures(raw)?;
    explicit(number(&caps, 1)?, number(&caps, 2)?, number(&caps, 3)?)
}

fn parse_epoch_millis(raw: &str, _order: DateOrder) -> Option<ParsedDate> {
    let millis = raw.parse::<i64>().ok()?;
    let date = DateTime::<Utc>::from_timestamp_millis(millis)?.date_naive();
    Some(dated(date))
}

fn ordered(caps: &Captures<'_>, order: DateOrder) -> Option<(u32, u32)> {
    let first = number(caps, 1)?;
    let second = number(caps, 2)?;
    match order {
        DateOrder::DayFirst => Some((second, first)),
        DateOrder::MonthFirst => Some((first, second)),
    }
}

fn number<T: FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

fn explicit(year: i32, month: u32, day: u32) -> Option<ParsedDate> {
    lenient_date(year, month, day).map(dated)
}

fn dated(date: NaiveDate) -> ParsedDate {
    ParsedDate::with_year(date.year(), date.month(), date.day())
}

fn yearless(month: u32, day: u32) -> Option<ParsedDate> {
    let date = lenient_date(LEAP_REFERENCE_YEAR, month, day)?;
    Some(ParsedDate::without_year(date.month(), date.day()))
}

/// Builds a date with lenient rollover of month and day overflow.
///
/// Month `0` and day `0` step back into the previous month/year.
fn lenient_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let month_index = i64::from(year) * 12 + i64::from(month) - 1;
    let normalized_year = i32::try_from(month_index.div_euclid(12)).ok()?;
    let normalized_month = u32::try_from(month_index.rem_euclid(12) + 1).ok()?;
    let first_of_month = NaiveDate::from_ymd_opt(normalized_year, normalized_month, 1)?;
    first_of_month.checked_add_signed(TimeDelta::try_days(i64::from(day) - 1)?)
}
