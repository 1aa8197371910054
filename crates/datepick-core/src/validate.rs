use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::trace;

use crate::date::{CalendarDate, DateBounds, days_in_month, month_name};
use crate::mask::SEPARATOR;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid format, use DD/MM/YYYY")]
    BadFormat,

    #[error("year must be between 1900 and 2100")]
    YearOutOfRange,

    #[error("month must be between 01 and 12")]
    MonthOutOfRange,

    #[error("invalid day for {}/{year}, maximum {max_day} days", month_label(.month0))]
    DayOutOfRange { max_day: u32, year: i32, month0: u32 },

    #[error("invalid date")]
    InvalidDate,

    #[error("date outside the allowed range ({} - {})", bound_label(.min), bound_label(.max))]
    OutOfBounds {
        min: Option<CalendarDate>,
        max: Option<CalendarDate>,
    },
}

fn month_label(month0: &u32) -> &'static str {
    month_name(*month0)
}

fn bound_label(bound: &Option<CalendarDate>) -> String {
    DateBounds::label(*bound)
}

fn date_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{1,4})$").ok())
        .as_ref()
}

/// Parses masked text into a date.
///
/// `Ok(None)` is the explicit "cleared" outcome for blank or separator-only
/// text and for text with no separator at all.
#[tracing::instrument(level = "debug", skip(bounds))]
pub fn validate(text: &str, bounds: &DateBounds) -> Result<Option<CalendarDate>, ValidationError> {
    if text.trim().is_empty()
        || text.chars().all(|ch| ch == SEPARATOR)
        || !text.contains(SEPARATOR)
    {
        trace!("blank input treated as cleared");
        return Ok(None);
    }

    let caps = date_pattern()
        .and_then(|re| re.captures(text))
        .ok_or(ValidationError::BadFormat)?;
    let field = |idx: usize| -> Result<i64, ValidationError> {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .ok_or(ValidationError::BadFormat)
    };

    let day = field(1)?;
    let month0 = field(2)? - 1;
    let mut year = field(3)?;
    if year < 100 {
        year += 2000;
    }

    if !(i64::from(MIN_YEAR)..=i64::from(MAX_YEAR)).contains(&year) {
        return Err(ValidationError::YearOutOfRange);
    }
    if !(0..=11).contains(&month0) {
        return Err(ValidationError::MonthOutOfRange);
    }

    // Both ranges were checked above, so the narrowing casts are exact.
    let (year, month0) = (year as i32, month0 as u32);
    let max_day = days_in_month(year, month0);
    if day < 1 || day > i64::from(max_day) {
        return Err(ValidationError::DayOutOfRange {
            max_day,
            year,
            month0,
        });
    }
    let day = day as u32;

    let date = CalendarDate::from_ymd(year, month0, day).ok_or(ValidationError::InvalidDate)?;
    if date.year() != year || date.month0() != month0 || date.day() != day {
        return Err(ValidationError::InvalidDate);
    }

    if !bounds.contains(date) {
        return Err(ValidationError::OutOfBounds {
            min: bounds.min,
            max: bounds.max,
        });
    }

    Ok(Some(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month0: u32, day: u32) -> CalendarDate {
        CalendarDate::from_ymd(year, month0, day).expect("valid date")
    }

    fn open() -> DateBounds {
        DateBounds::default()
    }

    #[test]
    fn blank_and_separator_only_text_clears() {
        for text in ["", "   ", "/", "//", "1508"] {
            assert_eq!(validate(text, &open()), Ok(None), "input {text:?}");
        }
    }

    #[test]
    fn parses_full_date() {
        assert_eq!(validate("15/08/1990", &open()), Ok(Some(date(1990, 7, 15))));
        assert_eq!(validate("1/2/2024", &open()), Ok(Some(date(2024, 1, 1))));
    }

    #[test]
    fn two_digit_years_land_in_this_century() {
        assert_eq!(validate("15/08/90", &open()), Ok(Some(date(2090, 7, 15))));
        assert_eq!(validate("01/01/5", &open()), Ok(Some(date(2005, 0, 1))));
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["15/08", "15/08/", "a5/08/1990", "15/08/19900", "15-08/1990"] {
            assert_eq!(validate(text, &open()), Err(ValidationError::BadFormat), "input {text:?}");
        }
    }

    #[test]
    fn year_range_is_checked_before_month() {
        assert_eq!(validate("01/13/1899", &open()), Err(ValidationError::YearOutOfRange));
        assert_eq!(validate("01/01/2101", &open()), Err(ValidationError::YearOutOfRange));
        assert_eq!(validate("01/01/100", &open()), Err(ValidationError::YearOutOfRange));
    }

    #[test]
    fn month_range() {
        assert_eq!(validate("01/13/2024", &open()), Err(ValidationError::MonthOutOfRange));
        assert_eq!(validate("01/00/2024", &open()), Err(ValidationError::MonthOutOfRange));
    }

    #[test]
    fn day_out_of_range_reports_maximum() {
        assert_eq!(
            validate("32/01/2024", &open()),
            Err(ValidationError::DayOutOfRange {
                max_day: 31,
                year: 2024,
                month0: 0
            })
        );
        assert!(matches!(
            validate("29/02/2023", &open()),
            Err(ValidationError::DayOutOfRange { max_day: 28, .. })
        ));
        assert!(matches!(
            validate("00/02/2024", &open()),
            Err(ValidationError::DayOutOfRange { max_day: 29, .. })
        ));
        assert_eq!(validate("29/02/2024", &open()), Ok(Some(date(2024, 1, 29))));
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = DateBounds::new(Some(date(2024, 0, 1)), None);
        assert_eq!(validate("01/01/2024", &bounds), Ok(Some(date(2024, 0, 1))));
        assert_eq!(
            validate("31/12/2023", &bounds),
            Err(ValidationError::OutOfBounds {
                min: Some(date(2024, 0, 1)),
                max: None
            })
        );
    }

    #[test]
    fn canonical_text_round_trips() {
        let bounded = DateBounds::new(Some(date(1950, 0, 1)), Some(date(2050, 11, 31)));
        let cases = [
            (date(1950, 0, 1), bounded),
            (date(1990, 7, 15), bounded),
            (date(2000, 1, 29), bounded),
            (date(2050, 11, 31), bounded),
            (date(1900, 0, 1), open()),
            (date(1900, 1, 28), open()),
            (date(2009, 8, 9), open()),
            (date(2100, 11, 31), open()),
        ];
        for (d, bounds) in cases {
            let first = validate(&d.display_text(), &bounds).expect("valid").expect("some");
            assert_eq!(first, d);
            let again = validate(&first.display_text(), &bounds).expect("valid");
            assert_eq!(again, Some(d));
        }
    }

    #[test]
    fn messages_name_the_problem() {
        let err = ValidationError::DayOutOfRange {
            max_day: 28,
            year: 2023,
            month0: 1,
        };
        assert_eq!(err.to_string(), "invalid day for February/2023, maximum 28 days");

        let err = ValidationError::OutOfBounds {
            min: Some(date(2024, 0, 1)),
            max: None,
        };
        assert_eq!(err.to_string(), "date outside the allowed range (01/01/2024 - no limit)");
    }
}
