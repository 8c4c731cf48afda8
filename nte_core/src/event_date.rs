//! The date model shared by the parser, the formatter and the calendar.

use chrono::{Datelike, NaiveDate};

/// The recognized German month names and their numbers.
pub static MONTHS: [(&str, u32); 12] = [
    ("Januar", 1),
    ("Februar", 2),
    ("März", 3),
    ("April", 4),
    ("Mai", 5),
    ("Juni", 6),
    ("Juli", 7),
    ("August", 8),
    ("September", 9),
    ("Oktober", 10),
    ("November", 11),
    ("Dezember", 12),
];

/// Days per month. February is fixed to 28 days, leap years are not considered.
static DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Cross-month pairs closer than this are treated as two separate days.
const SEPARATE_DATES_MAX_DAYS: i64 = 14;
/// Cross-month pairs must start after this day of month to be treated as two separate days.
const SEPARATE_DATES_MIN_START_DAY: u32 = 20;

/// Look up a month number by its German name (case-sensitive).
pub fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(month_name, _)| *month_name == name)
        .map(|(_, number)| *number)
}

/// Look up the static month name, so it can be stored without allocating.
fn month_name(name: &str) -> Option<&'static str> {
    MONTHS
        .iter()
        .find(|(month_name, _)| *month_name == name)
        .map(|(month_name, _)| *month_name)
}

/// Number of days in a month (1-based).
pub fn days_in_month(month: u32) -> Option<u32> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    DAYS_IN_MONTH.get(index).copied()
}

/// The date (or dates) of a single event.
///
/// `end` is only set for ranges and pairs of dates and is never before `start`.
/// `month_name` is only set if the whole month was named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDate {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub month_name: Option<&'static str>,
}

impl EventDate {
    pub fn single(start: NaiveDate) -> Self {
        Self {
            start,
            end: None,
            month_name: None,
        }
    }

    /// Build a range, the earlier date becomes the start.
    pub fn range(first: NaiveDate, second: NaiveDate) -> Self {
        let (start, end) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Self {
            start,
            end: Some(end),
            month_name: None,
        }
    }

    /// Build a range spanning the whole named month.
    pub fn month(name: &str, year: i32) -> Option<Self> {
        let month_name = month_name(name)?;
        let month = month_number(month_name)?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = NaiveDate::from_ymd_opt(year, month, days_in_month(month)?)?;
        Some(Self {
            start,
            end: Some(end),
            month_name: Some(month_name),
        })
    }

    /// Whether the pair of dates is rather two separate days than a continuous range.
    ///
    /// "26. Juli und 8. August" and "26. Juli bis 8. August" end up as the same pair of dates.
    /// A pair crossing a month boundary within two weeks, starting late in the month, is read as
    /// two separate days. This is a heuristic!
    pub fn is_separate_dates(&self) -> bool {
        let Some(end) = self.end else {
            return false;
        };
        self.start.month() != end.month()
            && end.signed_duration_since(self.start).num_days() <= SEPARATE_DATES_MAX_DAYS
            && self.start.day() > SEPARATE_DATES_MIN_START_DAY
    }
}
