//! Calendar dates, compact URL date form, and inclusive date ranges.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::provider::DataError;

/// Separator convention for user supplied date strings.
///
/// Month and day may be unpadded: `2018-3-1` and `2018/3/1` are both accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateStyle {
    /// `YYYY-MM-DD`
    Hyphen,
    /// `YYYY/MM/DD`
    Slash,
}

impl DateStyle {
    fn format(self) -> &'static str {
        match self {
            Self::Hyphen => "%Y-%m-%d",
            Self::Slash => "%Y/%m/%d",
        }
    }

    /// Pick the style from the first separator found in `s`.
    pub fn detect(s: &str) -> Option<Self> {
        s.chars().find_map(|c| match c {
            '-' => Some(Self::Hyphen),
            '/' => Some(Self::Slash),
            _ => None,
        })
    }

    /// Parse a date string in this style.
    pub fn parse(self, s: &str) -> Result<NaiveDate, DataError> {
        NaiveDate::parse_from_str(s.trim(), self.format()).map_err(|e| {
            DataError::InvalidInput(format!(
                "'{s}' is not a calendar date in {} form: {e}",
                self.format()
            ))
        })
    }
}

/// Parse a date string, detecting the separator.
pub fn parse_date(s: &str) -> Result<NaiveDate, DataError> {
    let style = DateStyle::detect(s).ok_or_else(|| {
        DataError::InvalidInput(format!(
            "'{s}' is not a calendar date: expected YYYY-MM-DD or YYYY/MM/DD"
        ))
    })?;
    style.parse(s)
}

/// Compact digit form used in provider URLs: `YYYYMMDD`.
pub fn compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Human readable form: `March 01, 2018`.
pub fn readable(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Inclusive calendar range. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range; `end` defaults to today (local time) when omitted.
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self, DataError> {
        let end = end.unwrap_or_else(|| Local::now().date_naive());
        if start > end {
            return Err(DataError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_compact(&self) -> String {
        compact(self.start)
    }

    pub fn end_compact(&self) -> String {
        compact(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", readable(self.start), readable(self.end))
    }
}
