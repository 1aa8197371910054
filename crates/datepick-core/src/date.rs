use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTH_SHORT_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const WEEKDAY_LABELS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// A Gregorian calendar date with no time component.
///
/// Months are zero based (`0` is January) to match the grid cursor; the
/// underlying storage is a [`NaiveDate`], so a value always names a real day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn from_ymd(year: i32, month0: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month0.checked_add(1)?, day).map(Self)
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month0(self) -> u32 {
        self.0.month0()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    pub fn naive(self) -> NaiveDate {
        self.0
    }

    /// Canonical `DD/MM/YYYY` display text.
    pub fn display_text(self) -> String {
        format!("{:02}/{:02}/{}", self.day(), self.month0() + 1, self.year())
    }

    pub fn iso(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateBounds {
    pub min: Option<CalendarDate>,
    pub max: Option<CalendarDate>,
}

impl DateBounds {
    pub fn new(min: Option<CalendarDate>, max: Option<CalendarDate>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.min.is_none_or(|min| date >= min) && self.max.is_none_or(|max| date <= max)
    }

    pub fn year_disabled(&self, year: i32) -> bool {
        self.min.is_some_and(|min| year < min.year()) || self.max.is_some_and(|max| year > max.year())
    }

    /// True when no day of the month falls inside the bounds.
    pub fn month_disabled(&self, year: i32, month0: u32) -> bool {
        let key = (year, month0);
        self.min.is_some_and(|min| key < (min.year(), min.month0()))
            || self.max.is_some_and(|max| key > (max.year(), max.month0()))
    }

    pub fn label(bound: Option<CalendarDate>) -> String {
        bound
            .map(CalendarDate::display_text)
            .unwrap_or_else(|| "no limit".to_string())
    }
}

/// Days in a zero-based month; `0` for an out-of-range month.
pub fn days_in_month(year: i32, month0: u32) -> u32 {
    month0
        .checked_add(1)
        .and_then(|month| NaiveDate::from_ymd_opt(year, month, 1))
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map_or(0, |last| last.day())
}

/// Weekday of the 1st of the month, `0` being Sunday.
pub fn first_weekday(year: i32, month0: u32) -> Option<u32> {
    CalendarDate::from_ymd(year, month0, 1).map(|date| date.naive().weekday().num_days_from_sunday())
}

pub fn month_name(month0: u32) -> &'static str {
    MONTH_NAMES.get(month0 as usize).copied().unwrap_or("")
}

pub fn month_short_name(month0: u32) -> &'static str {
    MONTH_SHORT_NAMES.get(month0 as usize).copied().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month0: u32, day: u32) -> CalendarDate {
        CalendarDate::from_ymd(year, month0, day).expect("valid date")
    }

    #[test]
    fn february_follows_leap_rules() {
        assert_eq!(days_in_month(2024, 1), 29);
        assert_eq!(days_in_month(2023, 1), 28);
        assert_eq!(days_in_month(1900, 1), 28);
        assert_eq!(days_in_month(2000, 1), 29);
        assert_eq!(days_in_month(2024, 12), 0);
    }

    #[test]
    fn days_in_month_agrees_with_chrono() {
        for year in [1900, 1999, 2000, 2023, 2024, 2100] {
            for month0 in 0..12 {
                let max = days_in_month(year, month0);
                assert!(CalendarDate::from_ymd(year, month0, max).is_some());
                assert!(CalendarDate::from_ymd(year, month0, max + 1).is_none());
            }
        }
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(CalendarDate::from_ymd(2023, 1, 29).is_none());
        assert!(CalendarDate::from_ymd(2024, 12, 1).is_none());
        assert!(CalendarDate::from_ymd(2024, 0, 0).is_none());
    }

    #[test]
    fn display_text_is_zero_padded() {
        assert_eq!(date(1990, 7, 5).display_text(), "05/08/1990");
        assert_eq!(date(2024, 11, 31).iso(), "2024-12-31");
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = DateBounds::new(Some(date(2024, 0, 1)), Some(date(2024, 11, 31)));
        assert!(bounds.contains(date(2024, 0, 1)));
        assert!(bounds.contains(date(2024, 11, 31)));
        assert!(!bounds.contains(date(2023, 11, 31)));
        assert!(!bounds.contains(date(2025, 0, 1)));
        assert!(DateBounds::default().contains(date(1, 0, 1)));
    }

    #[test]
    fn month_disabled_only_when_whole_month_is_outside() {
        let bounds = DateBounds::new(Some(date(2024, 2, 15)), Some(date(2024, 8, 10)));
        assert!(bounds.month_disabled(2024, 1));
        assert!(!bounds.month_disabled(2024, 2));
        assert!(!bounds.month_disabled(2024, 8));
        assert!(bounds.month_disabled(2024, 9));
        assert!(bounds.year_disabled(2023));
        assert!(!bounds.year_disabled(2024));
    }

    #[test]
    fn first_weekday_counts_from_sunday() {
        // 1 September 2024 was a Sunday, 1 February 2024 a Thursday.
        assert_eq!(first_weekday(2024, 8), Some(0));
        assert_eq!(first_weekday(2024, 1), Some(4));
    }
}
