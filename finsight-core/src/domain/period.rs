//! Reporting period ("YYYYMM") and date-to-period extraction

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::domain::result::Error;

/// India Standard Time, the default reporting timezone (UTC+05:30)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Date-time formats carrying an explicit offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%a %b %d %Y %H:%M:%S GMT%z",
];

/// Date-time formats without offset, read as local time
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y, %I:%M:%S %p",
    "%d/%m/%Y, %H:%M:%S",
    "%d/%m/%Y %I:%M:%S %p",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Date-only formats (day-first for slash/dash dates)
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%a %b %d %Y",
];

/// A calendar month, written as "YYYYMM"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Create a period; `None` when the month or year is out of range
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (0..=9999).contains(&year) && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Period containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month before this one, rolling the year back after January
    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The month after this one
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First day of the month
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Number of days in the month
    pub fn days_in_month(&self) -> u32 {
        let next = self.next();
        match (self.first_day(), next.first_day()) {
            (Some(start), Some(end)) => (end - start).num_days() as u32,
            _ => 30,
        }
    }

    /// Human label, e.g. "June 2025"
    pub fn label(&self) -> String {
        self.first_day()
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation(format!(
                "Invalid period '{}': expected YYYYMM",
                s
            )));
        }

        let year: i32 = s[..4]
            .parse()
            .map_err(|_| Error::validation(format!("Invalid period year in '{}'", s)))?;
        let month: u32 = s[4..]
            .parse()
            .map_err(|_| Error::validation(format!("Invalid period month in '{}'", s)))?;

        Period::new(year, month)
            .ok_or_else(|| Error::validation(format!("Invalid period '{}': month must be 01-12", s)))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Build the reporting timezone from a UTC offset in minutes
pub fn utc_offset(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// Derive the period of a transaction date value
///
/// Accepts ISO-8601 strings (with or without offset), common locale
/// formats, 6-digit period strings, and epoch milliseconds given either as
/// a JSON number or a 12-13 digit string. Returns `None` for anything else.
pub fn extract_period(value: &JsonValue, offset: &FixedOffset) -> Option<Period> {
    match value {
        JsonValue::String(s) => period_from_str(s, offset),
        JsonValue::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))?;
            period_from_epoch_millis(millis, offset)
        }
        _ => None,
    }
}

fn period_from_epoch_millis(millis: i64, offset: &FixedOffset) -> Option<Period> {
    let utc = DateTime::from_timestamp_millis(millis)?;
    Some(Period::from_date(utc.with_timezone(offset).date_naive()))
}

fn period_from_str(raw: &str, offset: &FixedOffset) -> Option<Period> {
    // JS Date strings end with "(India Standard Time)"
    let s = raw.split(" (").next().unwrap_or(raw).trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return match s.len() {
            6 => s.parse().ok(),
            12 | 13 => s
                .parse::<i64>()
                .ok()
                .and_then(|ms| period_from_epoch_millis(ms, offset)),
            _ => None,
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Period::from_date(dt.with_timezone(offset).date_naive()));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(Period::from_date(dt.with_timezone(offset).date_naive()));
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Period::from_date(dt.date()));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(Period::from_date(date));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ist() -> FixedOffset {
        utc_offset(DEFAULT_UTC_OFFSET_MINUTES).unwrap()
    }

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn test_prev_period() {
        assert_eq!(p("202501").prev().to_string(), "202412");
        assert_eq!(p("202506").prev().to_string(), "202505");
        assert_eq!(p("202512").next().to_string(), "202601");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("2025-06".parse::<Period>().is_err());
        assert!("20256".parse::<Period>().is_err());
        assert!("202513".parse::<Period>().is_err());
        assert!("202500".parse::<Period>().is_err());
        assert!("abcdef".parse::<Period>().is_err());
        assert_eq!(p(" 202506 ").to_string(), "202506");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(p("202402").days_in_month(), 29);
        assert_eq!(p("202502").days_in_month(), 28);
        assert_eq!(p("202512").days_in_month(), 31);
        assert_eq!(p("202506").label(), "June 2025");
    }

    #[test]
    fn test_iso_with_offset_converted_to_ist() {
        // 20:00 UTC on Jan 31 is already Feb 1 in India
        let period = extract_period(&json!("2025-01-31T20:00:00Z"), &ist());
        assert_eq!(period, Some(p("202502")));

        let period = extract_period(&json!("2025-06-15T10:30:00+05:30"), &ist());
        assert_eq!(period, Some(p("202506")));
    }

    #[test]
    fn test_naive_and_locale_strings() {
        let tz = ist();
        assert_eq!(extract_period(&json!("2025-06-15"), &tz), Some(p("202506")));
        assert_eq!(extract_period(&json!("2025-06-15T23:59:59.123"), &tz), Some(p("202506")));
        assert_eq!(extract_period(&json!("15/06/2025"), &tz), Some(p("202506")));
        assert_eq!(extract_period(&json!("15/6/2025, 10:30:00 pm"), &tz), Some(p("202506")));
        assert_eq!(extract_period(&json!("Jun 15, 2025"), &tz), Some(p("202506")));
        assert_eq!(extract_period(&json!("15 June 2025"), &tz), Some(p("202506")));
    }

    #[test]
    fn test_js_date_string() {
        let period = extract_period(
            &json!("Sun Jun 15 2025 10:30:00 GMT+0530 (India Standard Time)"),
            &ist(),
        );
        assert_eq!(period, Some(p("202506")));
    }

    #[test]
    fn test_epoch_millis() {
        let tz = ist();
        assert_eq!(extract_period(&json!(1717200000000i64), &tz), Some(p("202406")));
        assert_eq!(extract_period(&json!(1738353600000.0), &tz), Some(p("202502")));
        assert_eq!(extract_period(&json!("1738353600000"), &tz), Some(p("202502")));
    }

    #[test]
    fn test_unparseable_is_none() {
        let tz = ist();
        assert_eq!(extract_period(&json!("not a date"), &tz), None);
        assert_eq!(extract_period(&json!(""), &tz), None);
        assert_eq!(extract_period(&json!(null), &tz), None);
        assert_eq!(extract_period(&json!(true), &tz), None);
        assert_eq!(extract_period(&json!({"date": "2025-06-01"}), &tz), None);
    }
}
