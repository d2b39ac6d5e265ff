use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Storage format for every ledger timestamp. Fixed width and always UTC, so
/// string order in SQLite equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A calendar month, `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The UTC month containing `now`.
    pub fn current(now: DateTime<Utc>) -> Self {
        Self::of(now.date_naive())
    }

    /// Strict `YYYY-MM` parsing: exactly seven characters, four-digit year,
    /// two-digit month in `01..=12`.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return None;
        }
        let (year, month) = (&s[..4], &s[5..]);
        if !year.bytes().all(|b| b.is_ascii_digit()) || !month.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Moves by `months` calendar months, negative values go backwards.
    pub fn shift(&self, months: i32) -> Self {
        let total_months = self.year * 12 + self.month as i32 - 1 + months;
        Self {
            year: total_months.div_euclid(12),
            month: (total_months.rem_euclid(12) + 1) as u32,
        }
    }

    pub fn next(&self) -> Self {
        self.shift(1)
    }

    /// `YYYY-MM-01T00:00:00Z`, the inclusive lower bound of the month.
    pub fn start_timestamp(&self) -> String {
        format!("{:04}-{:02}-01T00:00:00Z", self.year, self.month)
    }

    /// Half-open `[start, next start)` bounds as stored timestamps.
    pub fn bounds(&self) -> (String, String) {
        (self.start_timestamp(), self.next().start_timestamp())
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::parse(s).ok_or(())
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts RFC 3339 (any offset, normalised to UTC) or a bare `YYYY-MM-DD`,
/// which means midnight UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive: NaiveDateTime| naive.and_utc())
}
