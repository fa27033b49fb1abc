//! Yearly expansion of one parsed date.
//!
//! # Invariants
//! - No occurrence precedes an explicit first year.
//! - Age is only displayed for dates with an explicit year.

use crate::config::YearWindow;
use crate::model::occurrence::{OccurrenceSkeleton, ParsedDate};
use chrono::NaiveDate;

/// Expands `parsed` into one skeleton per year of the window around
/// `current_year`, both ends inclusive.
pub fn expand(
    parsed: &ParsedDate,
    current_year: i32,
    window: YearWindow,
) -> Vec<OccurrenceSkeleton> {
    let first = current_year.saturating_sub(window.back as i32);
    let last = current_year.saturating_add(window.forward as i32);

    (first..=last)
        .filter(|target_year| !(parsed.has_explicit_year && *target_year < parsed.year))
        .filter_map(|target_year| {
            let age = target_year - parsed.year;
            let date = place_in_year(parsed.month, parsed.day, target_year)?;
            Some(OccurrenceSkeleton {
                target_year,
                date,
                age,
                include_age: parsed.has_explicit_year && age >= 0,
            })
        })
        .collect()
}

/// Places a month/day in `year`; Feb 29 falls back to Feb 28.
fn place_in_year(month: u32, day: u32, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        if month == 2 && day == 29 {
            NaiveDate::from_ymd_opt(year, 2, 28)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::expand;
    use crate::config::YearWindow;
    use crate::model::occurrence::{ParsedDate, DAY_MILLIS};
    use chrono::{Datelike, NaiveDate};

    const WINDOW: YearWindow = YearWindow {
        back: 3,
        forward: 5,
    };

    #[test]
    fn recent_birth_year_skips_earlier_years() {
        let skeletons = expand(&ParsedDate::with_year(2023, 4, 5), 2024, WINDOW);
        let years: Vec<i32> = skeletons.iter().map(|s| s.target_year).collect();
        assert_eq!(years, (2023..=2029).collect::<Vec<_>>());
        assert_eq!(skeletons[0].age, 0);
        assert!(skeletons[0].include_age);
        assert_eq!(skeletons[1].age, 1);
        assert!(skeletons.iter().all(|s| s.include_age));
    }

    #[test]
    fn unknown_year_spans_full_window_without_age() {
        let skeletons = expand(&ParsedDate::without_year(4, 5), 2024, WINDOW);
        assert_eq!(skeletons.len(), 9);
        assert_eq!(skeletons.first().map(|s| s.target_year), Some(2021));
        assert_eq!(skeletons.last().map(|s| s.target_year), Some(2029));
        assert!(skeletons.iter().all(|s| !s.include_age));
    }

    #[test]
    fn dates_keep_month_and_day_and_span_one_utc_day() {
        let skeletons = expand(&ParsedDate::with_year(1980, 12, 31), 2024, WINDOW);
        for skeleton in &skeletons {
            assert_eq!((skeleton.date.month(), skeleton.date.day()), (12, 31));
            assert_eq!(skeleton.date.year(), skeleton.target_year);
            assert_eq!(skeleton.start_millis() % DAY_MILLIS, 0);
        }
        assert_eq!(skeletons[3].age, 44);
    }

    #[test]
    fn leap_day_moves_to_feb_28_in_common_years() {
        let skeletons = expand(&ParsedDate::without_year(2, 29), 2024, WINDOW);
        let leap = skeletons.iter().find(|s| s.target_year == 2024).expect("2024 present");
        assert_eq!(leap.date, NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid"));
        let common = skeletons.iter().find(|s| s.target_year == 2025).expect("2025 present");
        assert_eq!(common.date, NaiveDate::from_ymd_opt(2025, 2, 28).expect("valid"));
    }

    #[test]
    fn future_first_year_yields_nothing_before_it() {
        let skeletons = expand(&ParsedDate::with_year(2040, 1, 1), 2024, WINDOW);
        assert!(skeletons.is_empty());
    }
}
