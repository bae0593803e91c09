//! Time buckets used as the second half of every summary key.

use std::fmt;
use std::str::FromStr;

use chrono::Datelike as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A time bucket for aggregation.
///
/// Periods are plain labels: nothing checks that a dataset's periods are
/// contiguous or within any range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Period {
    /// A calendar year.
    Year(i32),
    /// A calendar month.
    YearMonth {
        /// Calendar year.
        year: i32,
        /// Month, 1-12.
        month: u32,
    },
    /// An inclusive span of years reported as a single figure
    /// (e.g. the `2012_18` columns).
    Range {
        /// First year of the span.
        start: i32,
        /// Last year of the span.
        end: i32,
    },
    /// A table with no time dimension.
    All,
    /// Records whose period could not be resolved.
    Undated,
}

impl Period {
    /// The month bucket containing `date`.
    #[must_use]
    pub fn month_of(date: NaiveDate) -> Self {
        Self::YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year bucket containing `date`.
    #[must_use]
    pub fn year_of(date: NaiveDate) -> Self {
        Self::Year(date.year())
    }

    /// Calendar year for year and month buckets.
    #[must_use]
    pub const fn year(self) -> Option<i32> {
        match self {
            Self::Year(year) | Self::YearMonth { year, .. } => Some(year),
            Self::Range { .. } | Self::All | Self::Undated => None,
        }
    }

    /// Month number for month buckets.
    #[must_use]
    pub const fn month(self) -> Option<u32> {
        match self {
            Self::YearMonth { month, .. } => Some(month),
            _ => None,
        }
    }
}

impl From<i32> for Period {
    fn from(year: i32) -> Self {
        Self::Year(year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::YearMonth { year, month } => write!(f, "{year}-{month:02}"),
            Self::Range { start, end } => write!(f, "{start}-{end}"),
            Self::All => write!(f, "all"),
            Self::Undated => write!(f, "undated"),
        }
    }
}

/// Error returned when a period label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePeriodError {
    /// The label that was rejected.
    pub label: String,
}

impl fmt::Display for ParsePeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid period '{}': expected YYYY, YYYY-MM, YYYY_YY, YYYY-YYYY or 'all'",
            self.label
        )
    }
}

impl std::error::Error for ParsePeriodError {}

impl FromStr for Period {
    type Err = ParsePeriodError;

    /// Accepts `2021`, `2021-03`, `2012_18`, `2012_2018`, `2012-2018`,
    /// `all` and `undated`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        let err = || ParsePeriodError {
            label: s.to_string(),
        };

        if label.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if label.eq_ignore_ascii_case("undated") {
            return Ok(Self::Undated);
        }
        if let Some(year) = parse_year(label) {
            return Ok(Self::Year(year));
        }

        if let Some((head, tail)) = label.split_once('_') {
            let start = parse_year(head).ok_or_else(err)?;
            let end = expand_year(start, tail).ok_or_else(err)?;
            return Ok(Self::Range { start, end });
        }

        if let Some((head, tail)) = label.split_once('-') {
            let year = parse_year(head).ok_or_else(err)?;
            if tail.len() == 4 {
                let end = parse_year(tail).ok_or_else(err)?;
                return Ok(Self::Range { start: year, end });
            }
            if (1..=2).contains(&tail.len()) && tail.bytes().all(|b| b.is_ascii_digit()) {
                let month: u32 = tail.parse().map_err(|_| err())?;
                if (1..=12).contains(&month) {
                    return Ok(Self::YearMonth { year, month });
                }
            }
        }

        Err(err())
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = ParsePeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Four ASCII digits.
fn parse_year(s: &str) -> Option<i32> {
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Resolves the end of a span written as either `2018` or `18`.
fn expand_year(start: i32, tail: &str) -> Option<i32> {
    if let Some(year) = parse_year(tail) {
        return Some(year);
    }
    if tail.len() == 2 && tail.bytes().all(|b| b.is_ascii_digit()) {
        let yy: i32 = tail.parse().ok()?;
        let century = start - start.rem_euclid(100);
        let end = century + yy;
        return Some(if end < start { end + 100 } else { end });
    }
    None
}
