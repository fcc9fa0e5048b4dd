//! Date helpers shared by the listings.

use chrono::{Datelike, Duration, Local, NaiveDate};

pub const ISO_DATE: &str = "%Y-%m-%d";

/// Current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}

pub fn parse_iso(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, ISO_DATE).ok()
}

/// Monday of the week containing `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Render a date relative to `today`: "today", "last Friday", "next Monday",
/// "Mar 3", falling back to the ISO date when it is more than a year away.
pub fn human_date(date: NaiveDate, today: NaiveDate) -> String {
    let days = (date - today).num_days();
    let weekday = date.format("%A");
    let week_delta = (start_of_week(date) - start_of_week(today)).num_days() / 7;

    match days {
        0 => "today".to_string(),
        -1 => "yesterday".to_string(),
        1 => "tomorrow".to_string(),
        -6..=-2 if week_delta == -1 => format!("last {}", weekday),
        -6..=-2 | 2..=6 if week_delta == 0 => weekday.to_string(),
        _ if week_delta == 1 => format!("next {}", weekday),
        -364..=364 => date.format("%b %-d").to_string(),
        _ => to_iso(date),
    }
}

/// Human rendering of an ISO date string. Unparseable input is returned as-is.
pub fn human_date_str(value: &str, today: NaiveDate) -> String {
    match parse_iso(value) {
        Some(date) => human_date(date, today),
        None => value.to_string(),
    }
}
