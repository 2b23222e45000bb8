//! Lenient date parsing for front matter and template values.
//!
//! Accepts the shapes authors actually write in front matter: RFC 3339,
//! `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]`, `YYYY-MM-DD`, `YYYY-MM`, `YYYY`,
//! RFC 2822, and epoch milliseconds. Values without an offset are taken as UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Years representable as a four-digit ISO prefix.
const MAX_YEAR: i32 = 9999;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Interpret a template value as a UTC instant.
///
/// Falsy values (`null`, `false`, `0`, `""`) and non-scalar values yield `None`.
pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?;
            if millis == 0 {
                return None;
            }
            Utc.timestamp_millis_opt(millis).single().filter(in_range)
        }
        _ => None,
    }
}

/// Parse a date string, returning `None` if no known shape matches.
///
/// A datetime without an offset, like `2024-03-05T10:00`, is read as UTC rather
/// than in the local timezone.
pub fn parse_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.and_utc())
        })
        .or_else(|| parse_calendar(s))
        .or_else(|| {
            DateTime::parse_from_rfc2822(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })?;

    in_range(&parsed).then_some(parsed)
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY` at UTC midnight.
fn parse_calendar(s: &str) -> Option<DateTime<Utc>> {
    let mut parts = s.split('-');
    let year = parse_digits(parts.next()?, 4)?;
    let month = parts.next().map_or(Some(1), |m| parse_digits(m, 2))?;
    let day = parts.next().map_or(Some(1), |d| parse_digits(d, 2))?;
    if parts.next().is_some() {
        return None;
    }

    NaiveDate::from_ymd_opt(year as i32, month, day)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// Parse exactly `len` ASCII digits.
#[inline]
fn parse_digits(s: &str, len: usize) -> Option<u32> {
    if s.len() != len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[inline]
fn in_range(dt: &DateTime<Utc>) -> bool {
    (0..=MAX_YEAR).contains(&dt.year())
}
