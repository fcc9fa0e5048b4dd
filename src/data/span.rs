//! Date spans used to scope a timesheet.
//!
//! Span bounds are zero-padded ISO dates, so range checks are plain string
//! comparisons.

use super::dates::{start_of_week, to_iso};
use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpanError {
    #[error("Unable to parse span '{0}'")]
    Unparseable(String),
    #[error("Invalid date '{0}'")]
    InvalidDate(String),
}

/// Field order for slash-separated dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    #[default]
    DayFirst,
    MonthFirst,
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    /// d/m, year defaults to the current one
    Short,
    /// d/m/yy
    TwoDigitYear,
    /// d/m/yyyy
    FullYear,
    /// yyyy-m-d
    Iso,
}

/// Tried in this order
static LAYOUTS: Lazy<Vec<(Layout, Regex)>> = Lazy::new(|| {
    vec![
        (Layout::Short, Regex::new(r"^(\d{1,2})/(\d{1,2})$").unwrap()),
        (
            Layout::TwoDigitYear,
            Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})$").unwrap(),
        ),
        (
            Layout::FullYear,
            Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap(),
        ),
        (Layout::Iso, Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap()),
    ]
});

/// An inclusive date range with a display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub from: String,
    pub to: String,
}

impl Span {
    fn day(name: &str, date: NaiveDate) -> Self {
        let iso = to_iso(date);
        Self {
            name: name.to_string(),
            label: None,
            from: iso.clone(),
            to: iso,
        }
    }

    /// Parse a span: `today`, `yesterday`, `week`, a single date, or `A..B`.
    pub fn parse(arg: &str, today: NaiveDate, order: DateOrder) -> Result<Self, SpanError> {
        let arg = arg.trim();

        match arg {
            "today" => return Ok(Self::day(arg, today)),
            "yesterday" => return Ok(Self::day(arg, today - Duration::days(1))),
            "week" => {
                return Ok(Self {
                    name: arg.to_string(),
                    label: Some("this week".to_string()),
                    from: to_iso(start_of_week(today)),
                    to: to_iso(today),
                })
            }
            _ => {}
        }

        if let Some((start, end)) = arg.split_once("..") {
            let (start, end) = (start.trim(), end.trim());
            if start.is_empty() || end.is_empty() {
                return Err(SpanError::Unparseable(arg.to_string()));
            }
            let first = Self::parse(start, today, order)?;
            let last = Self::parse(end, today, order)?;
            return Ok(Self {
                name: arg.to_string(),
                label: None,
                from: first.from,
                to: last.to,
            });
        }

        let date = parse_date(arg, today, order)?;
        Ok(Self::day(arg, date))
    }

    /// Display label, falling back to the name
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Whether an ISO date falls inside the span, bounds included
    pub fn contains(&self, date: &str) -> bool {
        date >= self.from.as_str() && date <= self.to.as_str()
    }
}

fn parse_date(arg: &str, today: NaiveDate, order: DateOrder) -> Result<NaiveDate, SpanError> {
    for (layout, regex) in LAYOUTS.iter() {
        let Some(caps) = regex.captures(arg) else {
            continue;
        };
        let num = |i: usize| -> u32 { caps[i].parse().unwrap_or(0) };

        let (year, a, b) = match layout {
            Layout::Short => (today.year(), num(1), num(2)),
            Layout::TwoDigitYear => (expand_year(num(3)), num(1), num(2)),
            Layout::FullYear => (num(3) as i32, num(1), num(2)),
            Layout::Iso => {
                return NaiveDate::from_ymd_opt(num(1) as i32, num(2), num(3))
                    .ok_or_else(|| SpanError::InvalidDate(arg.to_string()));
            }
        };

        let (month, day) = match order {
            DateOrder::DayFirst => (b, a),
            DateOrder::MonthFirst => (a, b),
        };

        return NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| SpanError::InvalidDate(arg.to_string()));
    }

    Err(SpanError::Unparseable(arg.to_string()))
}

/// 00-68 are 20xx, 69-99 are 19xx
fn expand_year(yy: u32) -> i32 {
    if yy < 69 {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        // a Wednesday
        NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
    }

    fn parse(arg: &str) -> Result<Span, SpanError> {
        Span::parse(arg, today(), DateOrder::DayFirst)
    }

    #[test]
    fn test_keywords() {
        let span = parse("today").unwrap();
        assert_eq!((span.from.as_str(), span.to.as_str()), ("2024-03-13", "2024-03-13"));

        let span = parse("yesterday").unwrap();
        assert_eq!((span.from.as_str(), span.to.as_str()), ("2024-03-12", "2024-03-12"));

        let span = parse("week").unwrap();
        assert_eq!((span.from.as_str(), span.to.as_str()), ("2024-03-11", "2024-03-13"));
        assert_eq!(span.label(), "this week");
    }

    #[test]
    fn test_iso_range_is_zero_padded() {
        let span = parse("2024-1-5..2024-1-10").unwrap();
        assert_eq!(span.from, "2024-01-05");
        assert_eq!(span.to, "2024-01-10");
        assert_eq!(span.name, "2024-1-5..2024-1-10");
    }

    #[test]
    fn test_slash_dates_day_first() {
        assert_eq!(parse("5/1").unwrap().from, "2024-01-05");
        assert_eq!(parse("5/1/23").unwrap().from, "2023-01-05");
        assert_eq!(parse("5/1/99").unwrap().from, "1999-01-05");
        assert_eq!(parse("5/1/2022").unwrap().from, "2022-01-05");
    }

    #[test]
    fn test_slash_dates_month_first() {
        let span = Span::parse("1/5", today(), DateOrder::MonthFirst).unwrap();
        assert_eq!(span.from, "2024-01-05");
    }

    #[test]
    fn test_mixed_range() {
        let span = parse("1/3..today").unwrap();
        assert_eq!(span.from, "2024-03-01");
        assert_eq!(span.to, "2024-03-13");
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(
            parse("banana"),
            Err(SpanError::Unparseable("banana".to_string()))
        );
        assert!(parse("2024-01-01..").is_err());
        assert!(parse("2024-01-01..banana").is_err());
    }

    #[test]
    fn test_impossible_date() {
        assert_eq!(
            parse("31/2"),
            Err(SpanError::InvalidDate("31/2".to_string()))
        );
    }

    #[test]
    fn test_contains_is_inclusive() {
        let span = parse("2024-01-01..2024-01-02").unwrap();
        assert!(span.contains("2024-01-01"));
        assert!(span.contains("2024-01-02"));
        assert!(!span.contains("2024-01-03"));
        assert!(!span.contains("2023-12-31"));
    }
}
