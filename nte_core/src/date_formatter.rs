//! This formatter renders events as single human-readable lines.

use chrono::NaiveDate;

use crate::event_date::EventDate;

static FORMAT: &str = "%Y-%m-%d";

/// Format an event as `<title>: <dates>`.
///
/// A whole month is noted after the title, e.g. `Bardentreffen (August): 2026-08-01 - 2026-08-31`.
/// Ranges are joined by " - ", two separate days by ", ".
pub fn format_event(title: &str, event_date: &EventDate) -> String {
    let title = match event_date.month_name {
        Some(month_name) => format!("{title} ({month_name})"),
        None => title.to_string(),
    };
    let start = format_date(&event_date.start);
    match event_date.end {
        None => format!("{title}: {start}"),
        Some(end) if event_date.is_separate_dates() => {
            format!("{title}: {start}, {}", format_date(&end))
        }
        Some(end) => format!("{title}: {start} - {}", format_date(&end)),
    }
}

fn format_date(date: &NaiveDate) -> String {
    date.format(FORMAT).to_string()
}
