//! This crate turns Nürnberg's "Top-Events" page into calendar events.
//! It parses the German date phrases of the page's headings and projects the events into an iCalendar.
//!
//! The events are read from <https://www.nuernberg.de/internet/stadtportal/veranstaltungen_events_highlights.html>.

pub use ical;

pub mod date_formatter;
pub mod date_parser;
pub mod event_client;
pub mod event_date;
