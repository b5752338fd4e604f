//! Defines [`CanonicalDate`], the calendar date every post carries, along with
//! the two renderings the rest of the pipeline needs: the human-readable form
//! shown on pages ([`display`]) and the RFC 2822 form required by RSS
//! ([`CanonicalDate::to_rfc2822`]).

use chrono::{Datelike, NaiveDate, NaiveTime};
use std::fmt;
use thiserror::Error;

/// A validated calendar date. Ordering is by year, then month, then day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    /// Returns the year of the date.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Renders the date as midnight UTC in the RFC 2822 format used by RSS
    /// `pubDate` elements, e.g. `Tue, 11 May 2021 00:00:00 +0000`.
    pub fn to_rfc2822(&self) -> String {
        self.0.and_time(NaiveTime::MIN).and_utc().to_rfc2822()
    }
}

impl From<NaiveDate> for CanonicalDate {
    fn from(date: NaiveDate) -> CanonicalDate {
        CanonicalDate(date)
    }
}

impl fmt::Display for CanonicalDate {
    /// Displays the date in its ISO 8601 (`YYYY-MM-DD`) form.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Returned when a string is not a valid `YYYY-MM-DD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date `{0}`: expected a calendar date formatted as YYYY-MM-DD")]
pub struct DateParseError(pub String);

/// Parses a stored `YYYY-MM-DD` date. `chrono` on its own accepts
/// single-digit months and days and signed years, so the shape is checked
/// before the calendar is.
pub fn normalize(raw: &str) -> Result<CanonicalDate, DateParseError> {
    let err = || DateParseError(raw.to_owned());
    let bytes = raw.as_bytes();
    let well_shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_shaped {
        return Err(err());
    }

    let field = |range: std::ops::Range<usize>| raw[range].parse::<u32>().map_err(|_| err());
    let year = field(0..4)? as i32;
    let month = field(5..7)?;
    let day = field(8..10)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .map(CanonicalDate)
        .ok_or_else(err)
}

/// Renders `date` for people. Dates in `reference_year` omit the year
/// (`May 11`); all others include it (`Dec 25, 2019`). `reference_year` is
/// the year the build started in.
pub fn display(date: CanonicalDate, reference_year: i32) -> String {
    if date.year() == reference_year {
        date.0.format("%b %-d").to_string()
    } else {
        date.0.format("%b %-d, %Y").to_string()
    }
}
