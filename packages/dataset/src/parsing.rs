//! Date parsing shared by every dataset.
//!
//! The conflict exports are written as ISO dates, while the raw IDP exports
//! use day-first slashed dates, so both are accepted.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a calendar date from a raw field value.
///
/// Accepted forms: `2021-03-15`, `2021-03-15T10:00:00`,
/// `2021-03-15 10:00:00`, day-first `15/03/2021` and `15.03.2021`,
/// month-only `2021-03` and `March 2021` (both resolved to the first of the
/// month). Returns `None` for anything else.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(date);
    }

    NaiveDate::parse_from_str(&format!("1 {s}"), "%d %B %Y").ok()
}
