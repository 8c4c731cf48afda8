//! This client fetches the top events page and turns its headings into events and calendars.

use std::sync::OnceLock;

use anyhow::Result;
use chrono::NaiveDate;
use ical::{
    generator::{IcalCalendar, IcalCalendarBuilder, IcalEvent, IcalEventBuilder, Property},
    ical_param, ical_property,
};
use regex::Regex;
use reqwest::Response;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::{
    date_parser::{parse_outcome, ParseOutcome},
    event_date::EventDate,
};

pub static URL: &str =
    "https://www.nuernberg.de/internet/stadtportal/veranstaltungen_events_highlights.html";
static PROD_ID: &str = "-//Nürnberg Top Events//nuernberg.de//";
static CALENDAR_NAME: &str = "Nürnberg Top Events";
static CALENDAR_DESCRIPTION: &str = "Top events in Nürnberg";
static TIMEZONE: &str = "Europe/Berlin";
static FORMAT: &str = "%Y%m%d";

/// An event as announced by a heading of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub title: String,
    pub date: EventDate,
}

/// Get the events of a specific year.
///
/// The page only lists the events of a single year, so this is empty for every other year.
pub async fn get_events(url: &str, year: i32) -> Result<Vec<Event>> {
    let response = get_response(url).await?;
    let events = extract_events(&response.text().await?, year);
    info!(year, count = events.len(), "fetched events");
    Ok(events)
}

/// Get the top events page from the official server.
async fn get_response(url: &str) -> Result<Response> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response)
}

fn page_year_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"Top-Events\s+(?P<year>\d{4})").expect("page year regex is valid")
    })
}

fn whitespace_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex is valid"))
}

/// Get the year the page lists its events for.
pub fn page_year(html: &str) -> Option<i32> {
    page_year_regex()
        .captures(html)
        .and_then(|captures| captures["year"].parse().ok())
}

/// Extract the events from the headings of the page.
///
/// Headings look like `<date phrase>: <title>`, everything else is ignored.
pub fn extract_events(html: &str, year: i32) -> Vec<Event> {
    let page_year = page_year(html);
    if page_year != Some(year) {
        debug!(year, ?page_year, "page does not list events of this year");
        return vec![];
    }
    let dom = Html::parse_document(html);
    let heading_selector = Selector::parse("h2").expect("heading selector is valid");
    let mut events: Vec<Event> = vec![];
    for heading in dom.select(&heading_selector) {
        let text = heading.text().collect::<String>();
        let Some((phrase, title)) = text.split_once(':') else {
            continue;
        };
        let phrase = phrase.trim();
        let title = whitespace_regex().replace_all(title.trim(), " ");
        match parse_outcome(phrase, year) {
            ParseOutcome::Parsed(date) => events.push(Event {
                title: title.into_owned(),
                date,
            }),
            ParseOutcome::Skipped => {
                debug!(phrase, %title, "event does not take place this year");
            }
            ParseOutcome::Unparseable(reason) => {
                warn!(phrase, %title, %reason, "could not parse event date");
            }
        }
    }
    events
}

/// Build the calendar from the events.
pub fn get_calendar(events: &[Event], source_url: &str) -> IcalCalendar {
    let changed = chrono::Local::now().format("%Y%m%dT%H%M%S").to_string();
    let mut calendar = IcalCalendarBuilder::version("2.0")
        .gregorian()
        .prodid(PROD_ID)
        .build();
    calendar
        .properties
        .push(ical_property!("X-WR-CALNAME", CALENDAR_NAME));
    calendar
        .properties
        .push(ical_property!("X-WR-CALDESC", CALENDAR_DESCRIPTION));
    for event in events {
        calendar
            .events
            .push(get_event(event, &changed, source_url));
    }
    calendar
}

/// Build a whole day event.
///
/// Ranges end the day after their last day, two separate days are listed as `RDATE`.
fn get_event(event: &Event, changed: &str, source_url: &str) -> IcalEvent {
    let start = event.date.start;
    let ical_event_builder = IcalEventBuilder::tzid(TIMEZONE)
        .uid(uid(&event.title, &start))
        .changed(changed)
        .one_day(format_date(&start))
        .set(ical_property!("SUMMARY", event.title.as_str()))
        .set(ical_property!("DESCRIPTION", source_url));
    let ical_event_builder = match event.date.end {
        None => ical_event_builder,
        Some(end) if event.date.is_separate_dates() => ical_event_builder.set(ical_property!(
            "RDATE",
            [start, end]
                .iter()
                .map(format_date)
                .collect::<Vec<String>>()
                .join(","),
            ical_param!("VALUE", "DATE")
        )),
        Some(end) => ical_event_builder.set(ical_property!(
            "DTEND",
            format_date(&end.succ_opt().unwrap_or(end)),
            ical_param!("VALUE", "DATE")
        )),
    };
    ical_event_builder.build()
}

fn format_date(date: &NaiveDate) -> String {
    date.format(FORMAT).to_string()
}

/// Get a unique id for a specific event.
///
/// Changing this function is a breaking change!
fn uid(title: &str, start: &NaiveDate) -> String {
    let whitespace_rep = "-";
    let title = whitespace_regex().replace_all(title, whitespace_rep);
    let start = format_date(start);
    format!("TopEvents_{start}_{title}@nuernberg.de")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use ical::generator::{IcalCalendar, IcalEvent};

    use crate::{
        date_parser::parse,
        event_client::{extract_events, get_calendar, get_events, page_year, uid, Event, URL},
        event_date::EventDate,
    };

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn get_test_events() -> Vec<Event> {
        vec![
            Event {
                title: String::from("Freizeit Messe"),
                date: EventDate::range(date("2026-03-04"), date("2026-03-08")),
            },
            Event {
                title: String::from("Biergartensaison"),
                date: EventDate::single(date("2026-05-01")),
            },
            Event {
                title: String::from("Blaue Nacht"),
                date: EventDate::range(date("2026-05-15"), date("2026-05-16")),
            },
            Event {
                title: String::from("Klassik Open Air"),
                date: EventDate::range(date("2026-07-26"), date("2026-08-08")),
            },
            Event {
                title: String::from("Sommer in Nürnberg"),
                date: EventDate::month("August", 2026).unwrap(),
            },
            Event {
                title: String::from("Stadtlauf"),
                date: EventDate::single(date("2026-08-09")),
            },
            Event {
                title: String::from("Altstadtfest: Herbst"),
                date: EventDate::range(date("2026-09-15"), date("2026-10-10")),
            },
        ]
    }

    /// Test whether the page can be fetched and contains events of some year.
    ///
    /// This is an online test!
    #[tokio::test]
    #[ignore]
    async fn test_get_events() {
        let html = reqwest::get(URL).await.unwrap().text().await.unwrap();
        let year = page_year(&html).unwrap();
        let events = get_events(URL, year).await.unwrap();
        assert!(!events.is_empty());
    }

    #[test]
    fn test_page_year() {
        let html = include_str!("event_client/tests/response.html");
        assert_eq!(page_year(html), Some(2026));
        assert_eq!(page_year("<h2>Veranstaltungen</h2>"), None);
    }

    /// Test whether the HTML is parsed correctly.
    ///
    /// This test is offline.
    #[test]
    fn test_extract_events() {
        let html = include_str!("event_client/tests/response.html");
        let events = extract_events(html, 2026);
        assert_eq!(events, get_test_events());
    }

    #[test]
    fn test_extract_events_of_other_year() {
        let html = include_str!("event_client/tests/response.html");
        assert!(extract_events(html, 2027).is_empty());
        assert!(extract_events(html, 2025).is_empty());
    }

    #[test]
    fn test_extract_events_without_headings() {
        assert!(extract_events("<p>Top-Events 2026</p>", 2026).is_empty());
    }

    fn find_event<'a>(calendar: &'a IcalCalendar, summary: &str) -> Option<&'a IcalEvent> {
        calendar.events.iter().find(|event| {
            event.properties.iter().any(|property| {
                property.name == "SUMMARY"
                    && property
                        .value
                        .as_ref()
                        .is_some_and(|value| value == summary)
            })
        })
    }

    fn get_property_value_of_event<'a>(
        calendar: &'a IcalCalendar,
        property_name: &str,
        summary: &str,
    ) -> Option<&'a str> {
        find_event(calendar, summary)
            .unwrap()
            .properties
            .iter()
            .find(|property| property.name == property_name)
            .and_then(|property| property.value.as_deref())
    }

    fn get_property_value_of_calendar<'a>(
        calendar: &'a IcalCalendar,
        property_name: &str,
    ) -> Option<&'a str> {
        calendar
            .properties
            .iter()
            .find(|property| property.name == property_name)
            .and_then(|property| property.value.as_deref())
    }

    #[test]
    fn test_get_calendar() {
        let calendar = get_calendar(&get_test_events(), URL);
        assert_eq!(calendar.events.len(), 7);
        assert_eq!(
            get_property_value_of_calendar(&calendar, "X-WR-CALNAME"),
            Some("Nürnberg Top Events")
        );
        assert_eq!(
            get_property_value_of_calendar(&calendar, "PRODID"),
            Some("-//Nürnberg Top Events//nuernberg.de//")
        );

        let stadtlauf_dtstart = get_property_value_of_event(&calendar, "DTSTART", "Stadtlauf");
        assert_eq!(stadtlauf_dtstart, Some("20260809"));
        let stadtlauf_rdate = get_property_value_of_event(&calendar, "RDATE", "Stadtlauf");
        assert_eq!(stadtlauf_rdate, None);

        let messe_dtstart = get_property_value_of_event(&calendar, "DTSTART", "Freizeit Messe");
        assert_eq!(messe_dtstart, Some("20260304"));
        let messe_dtend = get_property_value_of_event(&calendar, "DTEND", "Freizeit Messe");
        assert_eq!(messe_dtend, Some("20260309"));

        let month_dtend = get_property_value_of_event(&calendar, "DTEND", "Sommer in Nürnberg");
        assert_eq!(month_dtend, Some("20260901"));

        let klassik_dtstart = get_property_value_of_event(&calendar, "DTSTART", "Klassik Open Air");
        assert_eq!(klassik_dtstart, Some("20260726"));
        let klassik_rdate = get_property_value_of_event(&calendar, "RDATE", "Klassik Open Air");
        assert_eq!(klassik_rdate, Some("20260726,20260808"));

        let klassik_uid = get_property_value_of_event(&calendar, "UID", "Klassik Open Air");
        assert_eq!(
            klassik_uid,
            Some("TopEvents_20260726_Klassik-Open-Air@nuernberg.de")
        );
        let klassik_description =
            get_property_value_of_event(&calendar, "DESCRIPTION", "Klassik Open Air");
        assert_eq!(klassik_description, Some(URL));
    }

    #[test]
    fn test_get_calendar_empty() {
        let calendar = get_calendar(&[], URL);
        assert!(calendar.events.is_empty());
    }

    #[test]
    fn test_uid() {
        let start = parse("9. August", 2026).unwrap().start;
        assert_eq!(
            uid("Blaue  Nacht\n2026", &start),
            "TopEvents_20260809_Blaue-Nacht-2026@nuernberg.de"
        );
    }
}
