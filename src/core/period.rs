//! Calendar month period used as the index of monthly tables.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A calendar month such as `2019 Jan`.
///
/// Stored as the number of months since year 0, so ordering and month
/// arithmetic are plain integer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    index: i64,
}

impl YearMonth {
    /// Create a year-month; `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ForecastError::InvalidParameter(format!(
                "month must be in 1..=12, got {}",
                month
            )));
        }
        Ok(Self {
            index: year as i64 * 12 + (month as i64 - 1),
        })
    }

    /// Create from a raw month count.
    pub fn from_index(index: i64) -> Self {
        Self { index }
    }

    /// Months since year 0.
    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn year(&self) -> i32 {
        self.index.div_euclid(12) as i32
    }

    /// 1-based month of the year.
    pub fn month(&self) -> u32 {
        self.index.rem_euclid(12) as u32 + 1
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        self.add_months(1)
    }

    pub fn add_months(&self, months: i64) -> Self {
        Self {
            index: self.index + months,
        }
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: YearMonth) -> i64 {
        other.index - self.index
    }

    /// First instant of the month in UTC.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or_else(|| {
                ForecastError::TimestampError(format!("{} is outside the datetime range", self))
            })
    }

    /// Month containing the given instant.
    pub fn from_datetime(datetime: &DateTime<Utc>) -> Self {
        Self {
            index: datetime.year() as i64 * 12 + (datetime.month() as i64 - 1),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abbr = MONTH_ABBREVIATIONS[(self.month() - 1) as usize];
        write!(f, "{} {}", self.year(), abbr)
    }
}

impl FromStr for YearMonth {
    type Err = ForecastError;

    /// Accepts `2019 Jan`, `2019 January`, `2019-01`, `2019-01-01` and
    /// full datetimes.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || ForecastError::Parse(format!("invalid year-month `{}`", s));

        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() == 2 {
            if let Ok(year) = parts[0].parse::<i32>() {
                if let Some(month) = month_from_name(parts[1]) {
                    return YearMonth::new(year, month);
                }
            }
        }

        if let Some(datetime) = parse_datetime(s) {
            return Ok(YearMonth::from_datetime(&datetime));
        }

        let dashed: Vec<&str> = s.split('-').collect();
        if dashed.len() == 2 {
            let year = dashed[0].parse::<i32>().map_err(|_| invalid())?;
            let month = dashed[1].parse::<u32>().map_err(|_| invalid())?;
            return YearMonth::new(year, month).map_err(|_| invalid());
        }

        Err(invalid())
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|full| full.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

/// Parse an instant from RFC 3339, `%Y-%m-%d %H:%M:%S` or a bare date.
///
/// Timestamps without an offset are taken as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Format an instant the way CSV output and tables show it.
pub fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
