//! This parser turns the German date phrases of the event headings into event dates.
//!
//! The phrases carry no year, so the year has to be given.
//! Supported are single dates ("9. August", "Ab 3. August"), whole months ("August"),
//! ranges ("4. bis 8. März", "15. September bis 10. Oktober")
//! and pairs ("1. und 2. August", "26. Juli und 8. August").

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::event_date::{month_number, EventDate};

/// Marks events which do not take place in the given year.
static SKIP_MARKER: &str = "Erst wieder";
static RANGE_WORD: &str = "bis";
static CONJUNCTION_WORD: &str = "und";

/// The result of parsing a date phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The event explicitly does not take place in the given year.
    Skipped,
    Unparseable(UnparseableReason),
    Parsed(EventDate),
}

impl ParseOutcome {
    pub fn event_date(self) -> Option<EventDate> {
        match self {
            ParseOutcome::Parsed(event_date) => Some(event_date),
            ParseOutcome::Skipped | ParseOutcome::Unparseable(_) => None,
        }
    }
}

/// Why a date phrase could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnparseableReason {
    #[error("no day followed by a month found")]
    NoDateToken,
    #[error("unknown month \"{0}\"")]
    UnknownMonth(String),
    #[error("there is no day {day} in month {month}")]
    InvalidDate { day: u32, month: u32 },
}

/// Parse a date phrase, see [`parse_outcome`].
///
/// Skipped and unparseable phrases both result in `None`.
pub fn parse(phrase: &str, year: i32) -> Option<EventDate> {
    parse_outcome(phrase, year).event_date()
}

/// Parse a date phrase into an event date of the given year.
///
/// The rules are tried in this order, the first one producing a date wins:
/// 1. the skip marker,
/// 2. a whole month,
/// 3. a range joined by "bis",
/// 4. a pair joined by "und",
/// 5. the first day followed by a month anywhere in the phrase.
///
/// If no rule matches, the reason of the first failing rule is returned.
pub fn parse_outcome(phrase: &str, year: i32) -> ParseOutcome {
    let phrase = phrase.trim();
    if phrase.contains(SKIP_MARKER) {
        return ParseOutcome::Skipped;
    }
    if let Some(event_date) = EventDate::month(phrase, year) {
        return ParseOutcome::Parsed(event_date);
    }
    let mut first_failure: Option<UnparseableReason> = None;
    for word in [RANGE_WORD, CONJUNCTION_WORD] {
        let Some((left, right)) = phrase.split_once(word) else {
            continue;
        };
        match parse_pair(left, right, year) {
            Ok(event_date) => return ParseOutcome::Parsed(event_date),
            Err(reason) => {
                first_failure.get_or_insert(reason);
            }
        }
    }
    match parse_single(phrase, year) {
        Ok(event_date) => ParseOutcome::Parsed(event_date),
        Err(reason) => ParseOutcome::Unparseable(first_failure.unwrap_or(reason)),
    }
}

/// Matches a day followed by a month, e.g. "8. März".
fn day_month_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
                (?P<day>\d+) # the day
                \.
                \s*
                (?P<month>\w+) # the month
            ",
        )
        .expect("day and month regex is valid")
    })
}

/// Matches a day optionally followed by a month, e.g. "4." or "15. September".
fn day_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
                (?P<day>\d+) # the day
                \.
                \s*
                (?P<month>\w+)? # the optional month
            ",
        )
        .expect("day regex is valid")
    })
}

/// A day with the (unresolved) month token following it.
#[derive(Debug)]
struct DateToken<'a> {
    day: u32,
    month: Option<&'a str>,
}

impl<'a> DateToken<'a> {
    /// Find the first token in the text.
    fn find(regex: &Regex, text: &'a str) -> Result<Self, UnparseableReason> {
        let captures = regex
            .captures(text)
            .ok_or(UnparseableReason::NoDateToken)?;
        let day = captures["day"]
            .parse()
            .map_err(|_| UnparseableReason::NoDateToken)?;
        let month = captures.name("month").map(|month| month.as_str());
        Ok(Self { day, month })
    }

    fn month_number(&self) -> Result<Option<u32>, UnparseableReason> {
        self.month
            .map(|name| {
                month_number(name).ok_or_else(|| UnparseableReason::UnknownMonth(name.to_string()))
            })
            .transpose()
    }

    fn required_month_number(&self) -> Result<u32, UnparseableReason> {
        self.month_number()?.ok_or(UnparseableReason::NoDateToken)
    }
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, UnparseableReason> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(UnparseableReason::InvalidDate { day, month })
}

/// Parse the two sides of a range or pair.
///
/// The right side needs a day and a month. The left side needs a day, its month defaults to the
/// month of the right side ("4. bis 8. März"). A left side naming another month gives a pair
/// crossing the month boundary ("26. Juli und 8. August").
fn parse_pair(left: &str, right: &str, year: i32) -> Result<EventDate, UnparseableReason> {
    let end_token = DateToken::find(day_month_regex(), right)?;
    let end_month = end_token.required_month_number()?;
    let start_token = DateToken::find(day_regex(), left)?;
    let start_month = start_token.month_number()?.unwrap_or(end_month);
    let start = date(year, start_month, start_token.day)?;
    let end = date(year, end_month, end_token.day)?;
    Ok(EventDate::range(start, end))
}

/// Parse the first day followed by a month anywhere in the phrase.
///
/// Any prefix is ignored ("Ab 3. August").
fn parse_single(phrase: &str, year: i32) -> Result<EventDate, UnparseableReason> {
    let token = DateToken::find(day_month_regex(), phrase)?;
    let month = token.required_month_number()?;
    Ok(EventDate::single(date(year, month, token.day)?))
}
